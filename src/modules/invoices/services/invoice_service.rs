use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::core::money::round2;
use crate::core::{AppError, CurrencyCode, LedgerStore, Result, WriteOp};
use crate::modules::invoices::models::Invoice;

/// Invoice lifecycle outside of settlement: create, edit, delete.
///
/// Each mutation keeps the currency aggregate's `amount_due` in step with the
/// sum of open balances, and refuses to touch an invoice once a payment has
/// been allocated to it (status no longer pending).
pub struct InvoiceService {
    store: Arc<dyn LedgerStore>,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create a pending invoice and add its total to the currency's due
    pub async fn create_invoice(
        &self,
        invoice_no: String,
        customer_id: String,
        currency: CurrencyCode,
        total_amount: Decimal,
        date: NaiveDate,
    ) -> Result<Invoice> {
        if self.store.invoice_by_no(&invoice_no).await?.is_some() {
            return Err(AppError::validation(format!(
                "Invoice number '{}' already exists",
                invoice_no
            )));
        }

        let customer = self
            .store
            .customer(&customer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer '{}' not found", customer_id)))?;
        let mut aggregate = self
            .store
            .currency_aggregate(&currency)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Currency aggregate '{}' not found", currency))
            })?;

        let invoice = Invoice::new(
            invoice_no,
            customer_id,
            customer.name,
            currency,
            round2(total_amount),
            date,
        )?;

        aggregate.amount_due = round2(aggregate.amount_due + invoice.total_amount);

        self.store
            .run_atomic_batch(vec![
                WriteOp::InsertInvoice(invoice.clone()),
                WriteOp::UpdateCurrencyAggregate(aggregate),
            ])
            .await?;

        info!(invoice_id = %invoice.id, invoice_no = %invoice.invoice_no, "invoice created");
        Ok(invoice)
    }

    /// Change a pending invoice's total, shifting the currency due by the
    /// difference
    pub async fn update_invoice_total(&self, invoice_id: &str, new_total: Decimal) -> Result<Invoice> {
        let mut invoice = self
            .store
            .invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", invoice_id)))?;

        if !invoice.is_mutable() {
            return Err(AppError::validation(format!(
                "Invoice '{}' has received payments and can no longer be edited",
                invoice.invoice_no
            )));
        }
        let new_total = round2(new_total);
        if new_total <= Decimal::ZERO {
            return Err(AppError::validation(
                "Invoice total amount must be positive",
            ));
        }

        let mut aggregate = self
            .store
            .currency_aggregate(&invoice.currency)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Currency aggregate '{}' not found",
                    invoice.currency
                ))
            })?;

        let delta = round2(new_total - invoice.total_amount);
        invoice.total_amount = new_total;
        // pending invoices have amount_paid == 0, so the balance is the total
        invoice.balance = new_total;
        aggregate.amount_due = round2(aggregate.amount_due + delta);

        self.store
            .run_atomic_batch(vec![
                WriteOp::UpdateInvoice(invoice.clone()),
                WriteOp::UpdateCurrencyAggregate(aggregate),
            ])
            .await?;

        Ok(invoice)
    }

    /// Delete a pending invoice and release its balance from the currency due
    pub async fn delete_invoice(&self, invoice_id: &str) -> Result<()> {
        let invoice = self
            .store
            .invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", invoice_id)))?;

        if !invoice.is_mutable() {
            return Err(AppError::validation(format!(
                "Invoice '{}' has received payments and cannot be deleted",
                invoice.invoice_no
            )));
        }

        let mut aggregate = self
            .store
            .currency_aggregate(&invoice.currency)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Currency aggregate '{}' not found",
                    invoice.currency
                ))
            })?;

        aggregate.amount_due = round2(aggregate.amount_due - invoice.balance);

        self.store
            .run_atomic_batch(vec![
                WriteOp::DeleteInvoice(invoice.id.clone()),
                WriteOp::UpdateCurrencyAggregate(aggregate),
            ])
            .await?;

        info!(invoice_id = %invoice.id, invoice_no = %invoice.invoice_no, "invoice deleted");
        Ok(())
    }
}
