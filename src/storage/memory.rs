use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::{AppError, CurrencyCode, LedgerStore, Result, WriteOp};
use crate::modules::currencies::models::CurrencyAggregate;
use crate::modules::customers::models::Customer;
use crate::modules::invoices::models::Invoice;
use crate::modules::payments::models::{Payment, PaymentAllocation};

/// In-memory `LedgerStore`.
///
/// Reference backend and the store the integration tests run against. A
/// single mutex guards all five collections; `run_atomic_batch` validates
/// every op before applying any of them under one lock acquisition, so the
/// all-or-nothing contract holds without a real transaction.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    customers: HashMap<String, Customer>,
    invoices: HashMap<String, Invoice>,
    payments: HashMap<String, Payment>,
    allocations: HashMap<String, PaymentAllocation>,
    /// Keyed by currency code; at most one aggregate per code
    aggregates: HashMap<String, CurrencyAggregate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for tests and fixtures

    pub fn seed_customer(&self, customer: Customer) {
        self.state
            .lock()
            .expect("store lock poisoned")
            .customers
            .insert(customer.id.clone(), customer);
    }

    pub fn seed_invoice(&self, invoice: Invoice) {
        self.state
            .lock()
            .expect("store lock poisoned")
            .invoices
            .insert(invoice.id.clone(), invoice);
    }

    pub fn seed_currency(&self, aggregate: CurrencyAggregate) {
        self.state
            .lock()
            .expect("store lock poisoned")
            .aggregates
            .insert(aggregate.code.to_string(), aggregate);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("store lock poisoned")
    }

    fn validate_ops(state: &State, ops: &[WriteOp]) -> Result<()> {
        for op in ops {
            match op {
                WriteOp::InsertInvoice(i) if state.invoices.contains_key(&i.id) => {
                    return Err(AppError::validation(format!(
                        "Invoice '{}' already exists",
                        i.id
                    )));
                }
                WriteOp::InsertPayment(p) if state.payments.contains_key(&p.id) => {
                    return Err(AppError::validation(format!(
                        "Payment '{}' already exists",
                        p.id
                    )));
                }
                WriteOp::InsertAllocation(a) if state.allocations.contains_key(&a.id) => {
                    return Err(AppError::validation(format!(
                        "Allocation '{}' already exists",
                        a.id
                    )));
                }
                WriteOp::UpdateInvoice(i) if !state.invoices.contains_key(&i.id) => {
                    return Err(AppError::not_found(format!("Invoice '{}' not found", i.id)));
                }
                WriteOp::UpdateCustomer(c) if !state.customers.contains_key(&c.id) => {
                    return Err(AppError::not_found(format!("Customer '{}' not found", c.id)));
                }
                WriteOp::UpdateCurrencyAggregate(a)
                    if !state.aggregates.contains_key(a.code.as_str()) =>
                {
                    return Err(AppError::not_found(format!(
                        "Currency aggregate '{}' not found",
                        a.code
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn open_invoices(
        &self,
        customer_id: &str,
        currency: &CurrencyCode,
    ) -> Result<Vec<Invoice>> {
        let state = self.lock();
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| i.customer_id == customer_id && &i.currency == currency && i.is_open())
            .cloned()
            .collect();
        invoices.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(invoices)
    }

    async fn invoice(&self, id: &str) -> Result<Option<Invoice>> {
        Ok(self.lock().invoices.get(id).cloned())
    }

    async fn invoice_by_no(&self, invoice_no: &str) -> Result<Option<Invoice>> {
        Ok(self
            .lock()
            .invoices
            .values()
            .find(|i| i.invoice_no == invoice_no)
            .cloned())
    }

    async fn customer(&self, id: &str) -> Result<Option<Customer>> {
        Ok(self.lock().customers.get(id).cloned())
    }

    async fn currency_aggregate(&self, code: &CurrencyCode) -> Result<Option<CurrencyAggregate>> {
        Ok(self.lock().aggregates.get(code.as_str()).cloned())
    }

    async fn payment(&self, id: &str) -> Result<Option<Payment>> {
        Ok(self.lock().payments.get(id).cloned())
    }

    async fn latest_payment(&self, customer_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .lock()
            .payments
            .values()
            .filter(|p| p.customer_id == customer_id)
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
            .cloned())
    }

    async fn allocations_for_payment(&self, payment_id: &str) -> Result<Vec<PaymentAllocation>> {
        let state = self.lock();
        let mut allocations: Vec<PaymentAllocation> = state
            .allocations
            .values()
            .filter(|a| a.payment_id == payment_id)
            .cloned()
            .collect();
        allocations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(allocations)
    }

    async fn payments_for_customer(&self, customer_id: &str) -> Result<Vec<Payment>> {
        let state = self.lock();
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.customer_id == customer_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(payments)
    }

    async fn invoices_for_currency(&self, code: &CurrencyCode) -> Result<Vec<Invoice>> {
        Ok(self
            .lock()
            .invoices
            .values()
            .filter(|i| &i.currency == code)
            .cloned()
            .collect())
    }

    async fn payments_for_currency(&self, code: &CurrencyCode) -> Result<Vec<Payment>> {
        Ok(self
            .lock()
            .payments
            .values()
            .filter(|p| &p.currency == code)
            .cloned()
            .collect())
    }

    async fn run_atomic_batch(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut state = self.lock();
        Self::validate_ops(&state, &ops)?;

        for op in ops {
            match op {
                WriteOp::InsertInvoice(i) | WriteOp::UpdateInvoice(i) => {
                    state.invoices.insert(i.id.clone(), i);
                }
                WriteOp::DeleteInvoice(id) => {
                    state.invoices.remove(&id);
                }
                WriteOp::InsertPayment(p) => {
                    state.payments.insert(p.id.clone(), p);
                }
                WriteOp::DeletePayment(id) => {
                    state.payments.remove(&id);
                }
                WriteOp::InsertAllocation(a) => {
                    state.allocations.insert(a.id.clone(), a);
                }
                WriteOp::DeleteAllocation(id) => {
                    state.allocations.remove(&id);
                }
                WriteOp::UpdateCustomer(c) => {
                    state.customers.insert(c.id.clone(), c);
                }
                WriteOp::UpdateCurrencyAggregate(a) => {
                    state.aggregates.insert(a.code.to_string(), a);
                }
            }
        }
        Ok(())
    }
}
