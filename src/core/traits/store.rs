use async_trait::async_trait;

use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use crate::modules::currencies::models::CurrencyAggregate;
use crate::modules::customers::models::Customer;
use crate::modules::invoices::models::Invoice;
use crate::modules::payments::models::{Payment, PaymentAllocation};

/// One record mutation inside an atomic batch.
///
/// `run_atomic_batch` is the only write path the engines use; a batch either
/// applies every op or none of them.
#[derive(Debug, Clone)]
pub enum WriteOp {
    InsertInvoice(Invoice),
    UpdateInvoice(Invoice),
    DeleteInvoice(String),
    InsertPayment(Payment),
    DeletePayment(String),
    InsertAllocation(PaymentAllocation),
    DeleteAllocation(String),
    UpdateCustomer(Customer),
    UpdateCurrencyAggregate(CurrencyAggregate),
}

/// Storage collaborator for the allocation/settlement/reversal engines.
///
/// Point reads plus a single all-or-nothing multi-record commit. The engines
/// never issue individual writes and never attempt manual rollback: partial
/// failure handling is delegated entirely to the batch atomicity contract of
/// the implementation (SQL transaction, document-store batch, in-memory lock).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open invoices (status pending or partially_paid) for a customer in
    /// one currency, ordered by creation time ascending. The FIFO settlement
    /// order is established here and must be preserved downstream.
    async fn open_invoices(
        &self,
        customer_id: &str,
        currency: &CurrencyCode,
    ) -> Result<Vec<Invoice>>;

    async fn invoice(&self, id: &str) -> Result<Option<Invoice>>;

    /// Lookup by human invoice number (unique across the system)
    async fn invoice_by_no(&self, invoice_no: &str) -> Result<Option<Invoice>>;

    async fn customer(&self, id: &str) -> Result<Option<Customer>>;

    async fn currency_aggregate(&self, code: &CurrencyCode) -> Result<Option<CurrencyAggregate>>;

    async fn payment(&self, id: &str) -> Result<Option<Payment>>;

    /// Most recently created payment for a customer, if any
    async fn latest_payment(&self, customer_id: &str) -> Result<Option<Payment>>;

    async fn allocations_for_payment(&self, payment_id: &str) -> Result<Vec<PaymentAllocation>>;

    /// All payments for a customer (recompute backstop)
    async fn payments_for_customer(&self, customer_id: &str) -> Result<Vec<Payment>>;

    /// All invoices in a currency (recompute backstop)
    async fn invoices_for_currency(&self, code: &CurrencyCode) -> Result<Vec<Invoice>>;

    /// All payments in a currency (recompute backstop)
    async fn payments_for_currency(&self, code: &CurrencyCode) -> Result<Vec<Payment>>;

    /// Apply every op or none of them
    async fn run_atomic_batch(&self, ops: Vec<WriteOp>) -> Result<()>;
}
