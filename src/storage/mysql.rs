use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use std::str::FromStr;

use crate::core::{AppError, CurrencyCode, LedgerStore, Result, WriteOp};
use crate::modules::currencies::models::CurrencyAggregate;
use crate::modules::customers::models::Customer;
use crate::modules::invoices::models::{Invoice, InvoiceStatus};
use crate::modules::payments::models::{Payment, PaymentAllocation};

/// MySQL-backed `LedgerStore`.
///
/// Queries are runtime-bound; `run_atomic_batch` maps onto a single SQL
/// transaction, which is the atomicity contract the engines rely on.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn apply_op(tx: &mut Transaction<'_, MySql>, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::InsertInvoice(i) => {
                sqlx::query(
                    r#"
                    INSERT INTO invoices (
                        id, invoice_no, customer_id, customer_name, currency,
                        total_amount, amount_paid, balance, received_jpy,
                        foreign_bank_charge, local_bank_charge, status, date, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&i.id)
                .bind(&i.invoice_no)
                .bind(&i.customer_id)
                .bind(&i.customer_name)
                .bind(i.currency.as_str())
                .bind(i.total_amount)
                .bind(i.amount_paid)
                .bind(i.balance)
                .bind(i.received_jpy)
                .bind(i.foreign_bank_charge)
                .bind(i.local_bank_charge)
                .bind(i.status.to_string())
                .bind(i.date)
                .bind(i.created_at)
                .execute(&mut **tx)
                .await?;
            }
            WriteOp::UpdateInvoice(i) => {
                let result = sqlx::query(
                    r#"
                    UPDATE invoices
                    SET total_amount = ?, amount_paid = ?, balance = ?,
                        received_jpy = ?, foreign_bank_charge = ?,
                        local_bank_charge = ?, status = ?
                    WHERE id = ?
                    "#,
                )
                .bind(i.total_amount)
                .bind(i.amount_paid)
                .bind(i.balance)
                .bind(i.received_jpy)
                .bind(i.foreign_bank_charge)
                .bind(i.local_bank_charge)
                .bind(i.status.to_string())
                .bind(&i.id)
                .execute(&mut **tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(AppError::not_found(format!("Invoice '{}' not found", i.id)));
                }
            }
            WriteOp::DeleteInvoice(id) => {
                sqlx::query("DELETE FROM invoices WHERE id = ?")
                    .bind(&id)
                    .execute(&mut **tx)
                    .await?;
            }
            WriteOp::InsertPayment(p) => {
                sqlx::query(
                    r#"
                    INSERT INTO payments (
                        id, payment_no, date, customer_id, customer_name, currency,
                        amount, exchange_rate, amount_in_jpy, allocated_amount,
                        foreign_bank_charge, local_bank_charge, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&p.id)
                .bind(&p.payment_no)
                .bind(p.date)
                .bind(&p.customer_id)
                .bind(&p.customer_name)
                .bind(p.currency.as_str())
                .bind(p.amount)
                .bind(p.exchange_rate)
                .bind(p.amount_in_jpy)
                .bind(p.allocated_amount)
                .bind(p.foreign_bank_charge)
                .bind(p.local_bank_charge)
                .bind(p.created_at)
                .execute(&mut **tx)
                .await?;
            }
            WriteOp::DeletePayment(id) => {
                sqlx::query("DELETE FROM payments WHERE id = ?")
                    .bind(&id)
                    .execute(&mut **tx)
                    .await?;
            }
            WriteOp::InsertAllocation(a) => {
                sqlx::query(
                    r#"
                    INSERT INTO payment_allocations (
                        id, payment_id, invoice_id, invoice_no, allocated_amount,
                        received_jpy, foreign_bank_charge, local_bank_charge,
                        exchange_rate, currency, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&a.id)
                .bind(&a.payment_id)
                .bind(&a.invoice_id)
                .bind(&a.invoice_no)
                .bind(a.allocated_amount)
                .bind(a.received_jpy)
                .bind(a.foreign_bank_charge)
                .bind(a.local_bank_charge)
                .bind(a.exchange_rate)
                .bind(a.currency.as_str())
                .bind(a.created_at)
                .execute(&mut **tx)
                .await?;
            }
            WriteOp::DeleteAllocation(id) => {
                sqlx::query("DELETE FROM payment_allocations WHERE id = ?")
                    .bind(&id)
                    .execute(&mut **tx)
                    .await?;
            }
            WriteOp::UpdateCustomer(c) => {
                let result = sqlx::query(
                    r#"
                    UPDATE customers
                    SET name = ?, email = ?, phone = ?, address = ?,
                        currency = ?, amount_in_jpy = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&c.name)
                .bind(&c.email)
                .bind(&c.phone)
                .bind(&c.address)
                .bind(c.currency.as_str())
                .bind(c.amount_in_jpy)
                .bind(&c.id)
                .execute(&mut **tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(AppError::not_found(format!("Customer '{}' not found", c.id)));
                }
            }
            WriteOp::UpdateCurrencyAggregate(a) => {
                let result = sqlx::query(
                    r#"
                    UPDATE currencies
                    SET name = ?, amount_due = ?, amount_paid = ?,
                        amount_in_jpy = ?, foreign_bank_charge = ?, local_bank_charge = ?
                    WHERE code = ?
                    "#,
                )
                .bind(&a.name)
                .bind(a.amount_due)
                .bind(a.amount_paid)
                .bind(a.amount_in_jpy)
                .bind(a.foreign_bank_charge)
                .bind(a.local_bank_charge)
                .bind(a.code.as_str())
                .execute(&mut **tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(AppError::not_found(format!(
                        "Currency aggregate '{}' not found",
                        a.code
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MySqlStore {
    async fn open_invoices(
        &self,
        customer_id: &str,
        currency: &CurrencyCode,
    ) -> Result<Vec<Invoice>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM invoices
            WHERE customer_id = ? AND currency = ?
              AND status IN ('pending', 'partially_paid')
            ORDER BY created_at ASC
            "#,
        )
        .bind(customer_id)
        .bind(currency.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(invoice_from_row).collect()
    }

    async fn invoice(&self, id: &str) -> Result<Option<Invoice>> {
        let row = sqlx::query("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn invoice_by_no(&self, invoice_no: &str) -> Result<Option<Invoice>> {
        let row = sqlx::query("SELECT * FROM invoices WHERE invoice_no = ?")
            .bind(invoice_no)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    async fn customer(&self, id: &str) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn currency_aggregate(&self, code: &CurrencyCode) -> Result<Option<CurrencyAggregate>> {
        let row = sqlx::query("SELECT * FROM currencies WHERE code = ?")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(aggregate_from_row).transpose()
    }

    async fn payment(&self, id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn latest_payment(&self, customer_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM payments
            WHERE customer_id = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    async fn allocations_for_payment(&self, payment_id: &str) -> Result<Vec<PaymentAllocation>> {
        let rows = sqlx::query(
            "SELECT * FROM payment_allocations WHERE payment_id = ? ORDER BY created_at ASC",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(allocation_from_row).collect()
    }

    async fn payments_for_customer(&self, customer_id: &str) -> Result<Vec<Payment>> {
        let rows =
            sqlx::query("SELECT * FROM payments WHERE customer_id = ? ORDER BY created_at ASC")
                .bind(customer_id)
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn invoices_for_currency(&self, code: &CurrencyCode) -> Result<Vec<Invoice>> {
        let rows = sqlx::query("SELECT * FROM invoices WHERE currency = ?")
            .bind(code.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(invoice_from_row).collect()
    }

    async fn payments_for_currency(&self, code: &CurrencyCode) -> Result<Vec<Payment>> {
        let rows = sqlx::query("SELECT * FROM payments WHERE currency = ?")
            .bind(code.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn run_atomic_batch(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for op in ops {
            Self::apply_op(&mut tx, op).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

// Row mapping helpers

fn currency_col(row: &MySqlRow, col: &str) -> Result<CurrencyCode> {
    let raw: String = row.try_get(col)?;
    CurrencyCode::new(&raw)
        .map_err(|e| AppError::internal(format!("Invalid currency in database: {}", e)))
}

fn invoice_from_row(row: &MySqlRow) -> Result<Invoice> {
    let status_raw: String = row.try_get("status")?;
    let status = InvoiceStatus::from_str(&status_raw)
        .map_err(|e| AppError::internal(format!("Invalid status in database: {}", e)))?;

    Ok(Invoice {
        id: row.try_get("id")?,
        invoice_no: row.try_get("invoice_no")?,
        customer_id: row.try_get("customer_id")?,
        customer_name: row.try_get("customer_name")?,
        currency: currency_col(row, "currency")?,
        total_amount: row.try_get("total_amount")?,
        amount_paid: row.try_get("amount_paid")?,
        balance: row.try_get("balance")?,
        received_jpy: row.try_get("received_jpy")?,
        foreign_bank_charge: row.try_get("foreign_bank_charge")?,
        local_bank_charge: row.try_get("local_bank_charge")?,
        status,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn customer_from_row(row: &MySqlRow) -> Result<Customer> {
    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        currency: currency_col(row, "currency")?,
        amount_in_jpy: row.try_get("amount_in_jpy")?,
        created_at: row.try_get("created_at")?,
    })
}

fn payment_from_row(row: &MySqlRow) -> Result<Payment> {
    Ok(Payment {
        id: row.try_get("id")?,
        payment_no: row.try_get("payment_no")?,
        date: row.try_get("date")?,
        customer_id: row.try_get("customer_id")?,
        customer_name: row.try_get("customer_name")?,
        currency: currency_col(row, "currency")?,
        amount: row.try_get("amount")?,
        exchange_rate: row.try_get("exchange_rate")?,
        amount_in_jpy: row.try_get("amount_in_jpy")?,
        allocated_amount: row.try_get("allocated_amount")?,
        foreign_bank_charge: row.try_get("foreign_bank_charge")?,
        local_bank_charge: row.try_get("local_bank_charge")?,
        created_at: row.try_get("created_at")?,
    })
}

fn allocation_from_row(row: &MySqlRow) -> Result<PaymentAllocation> {
    Ok(PaymentAllocation {
        id: row.try_get("id")?,
        payment_id: row.try_get("payment_id")?,
        invoice_id: row.try_get("invoice_id")?,
        invoice_no: row.try_get("invoice_no")?,
        allocated_amount: row.try_get("allocated_amount")?,
        received_jpy: row.try_get("received_jpy")?,
        foreign_bank_charge: row.try_get("foreign_bank_charge")?,
        local_bank_charge: row.try_get("local_bank_charge")?,
        exchange_rate: row.try_get("exchange_rate")?,
        currency: currency_col(row, "currency")?,
        created_at: row.try_get("created_at")?,
    })
}

fn aggregate_from_row(row: &MySqlRow) -> Result<CurrencyAggregate> {
    Ok(CurrencyAggregate {
        id: row.try_get("id")?,
        code: currency_col(row, "code")?,
        name: row.try_get("name")?,
        amount_due: row.try_get("amount_due")?,
        amount_paid: row.try_get("amount_paid")?,
        amount_in_jpy: row.try_get("amount_in_jpy")?,
        foreign_bank_charge: row.try_get("foreign_bank_charge")?,
        local_bank_charge: row.try_get("local_bank_charge")?,
    })
}
