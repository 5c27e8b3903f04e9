use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core::money::round2;
use crate::core::{AppError, LedgerStore, Result, WriteOp};
use crate::modules::invoices::models::InvoiceStatus;
use crate::modules::payments::models::Payment;

/// Undoes a settled payment: the exact algebraic inverse of settlement.
///
/// Only the customer's most recent payment may be reversed; unwinding an
/// older one would leave every later payment's invoice mutations computed
/// against balances that no longer existed.
pub struct ReversalService {
    store: Arc<dyn LedgerStore>,
}

impl ReversalService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Whether this payment is the customer's most recent by creation time.
    /// Exposed so callers can disable the delete action before attempting it.
    pub async fn is_latest_payment(&self, payment: &Payment) -> Result<bool> {
        let latest = self.store.latest_payment(&payment.customer_id).await?;
        Ok(latest.map(|p| p.id) == Some(payment.id.clone()))
    }

    /// Reverse a payment and delete it together with its allocations.
    ///
    /// Fails with `NotLatestPayment` before any mutation when the payment is
    /// not the customer's most recent, and with `NotFound` when the payment
    /// is absent or has an allocated amount but no allocation records. An
    /// invoice that vanished since settlement is skipped with a warning; it
    /// cannot be un-reversed but must not abort the rest.
    pub async fn reverse(&self, payment_id: &str) -> Result<()> {
        let payment = self
            .store
            .payment(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", payment_id)))?;

        if !self.is_latest_payment(&payment).await? {
            return Err(AppError::NotLatestPayment(payment_id.to_string()));
        }

        let allocations = self.store.allocations_for_payment(payment_id).await?;
        if allocations.is_empty() && payment.allocated_amount > Decimal::ZERO {
            return Err(AppError::not_found(format!(
                "No allocations recorded for payment '{}'",
                payment.payment_no
            )));
        }

        let mut ops: Vec<WriteOp> = Vec::with_capacity(allocations.len() * 2 + 3);

        for alloc in &allocations {
            let Some(mut invoice) = self.store.invoice(&alloc.invoice_id).await? else {
                warn!(
                    invoice_id = %alloc.invoice_id,
                    allocation_id = %alloc.id,
                    "invoice missing during reversal, skipping its mutations"
                );
                ops.push(WriteOp::DeleteAllocation(alloc.id.clone()));
                continue;
            };

            // arithmetic stays unclamped; only the stored amount_paid clamps
            // at zero, and the balance is derived from the unclamped value
            let unclamped_paid = round2(invoice.amount_paid - alloc.allocated_amount);
            invoice.balance = round2(invoice.total_amount - unclamped_paid);
            invoice.amount_paid = unclamped_paid.max(Decimal::ZERO);
            invoice.status = InvoiceStatus::for_balance(invoice.balance, invoice.total_amount);
            invoice.foreign_bank_charge =
                round2(invoice.foreign_bank_charge - alloc.foreign_bank_charge);
            invoice.local_bank_charge =
                round2(invoice.local_bank_charge - alloc.local_bank_charge);
            invoice.received_jpy -= alloc.received_jpy;

            ops.push(WriteOp::UpdateInvoice(invoice));
            ops.push(WriteOp::DeleteAllocation(alloc.id.clone()));
        }

        ops.push(WriteOp::DeletePayment(payment.id.clone()));

        match self.store.customer(&payment.customer_id).await? {
            Some(mut customer) => {
                customer.amount_in_jpy = round2(customer.amount_in_jpy - payment.amount_in_jpy);
                ops.push(WriteOp::UpdateCustomer(customer));
            }
            None => warn!(
                customer_id = %payment.customer_id,
                "customer missing during reversal, yen total not adjusted"
            ),
        }

        match self.store.currency_aggregate(&payment.currency).await? {
            Some(mut aggregate) => {
                aggregate.amount_paid = round2(aggregate.amount_paid - payment.allocated_amount);
                aggregate.amount_due = round2(aggregate.amount_due + payment.allocated_amount);
                aggregate.foreign_bank_charge =
                    round2(aggregate.foreign_bank_charge - payment.foreign_bank_charge);
                aggregate.local_bank_charge =
                    round2(aggregate.local_bank_charge - payment.local_bank_charge);
                aggregate.amount_in_jpy -= payment.amount_in_jpy;
                ops.push(WriteOp::UpdateCurrencyAggregate(aggregate));
            }
            None => warn!(
                currency = %payment.currency,
                "currency aggregate missing during reversal, totals not adjusted"
            ),
        }

        self.store.run_atomic_batch(ops).await?;

        info!(
            payment_id = %payment.id,
            payment_no = %payment.payment_no,
            customer_id = %payment.customer_id,
            allocations = allocations.len(),
            "payment reversed and deleted"
        );

        Ok(())
    }
}

impl std::fmt::Debug for ReversalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReversalService").finish_non_exhaustive()
    }
}
