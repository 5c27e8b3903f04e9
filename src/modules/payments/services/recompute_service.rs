use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::core::money::round2;
use crate::core::{CurrencyCode, LedgerStore, Result};

/// Currency totals rebuilt from history rather than read from the
/// incrementally-maintained aggregate record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecomputedCurrencyTotals {
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub amount_in_jpy: Decimal,
    pub foreign_bank_charge: Decimal,
    pub local_bank_charge: Decimal,
}

/// Correctness backstop for the denormalized counters.
///
/// Customer yen totals and currency aggregates are caches updated
/// imperatively at every settlement and reversal; under partial failure or
/// concurrent access they can drift. This service recomputes the same values
/// from the payment and invoice history without writing anything, so callers
/// can reconcile the caches against ground truth.
pub struct RecomputeService {
    store: Arc<dyn LedgerStore>,
}

impl RecomputeService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Sum of `amount_in_jpy` over the customer's payments
    pub async fn recompute_customer_jpy(&self, customer_id: &str) -> Result<Decimal> {
        let payments = self.store.payments_for_customer(customer_id).await?;
        let total = round2(payments.iter().map(|p| p.amount_in_jpy).sum());
        debug!(customer_id, %total, payments = payments.len(), "recomputed customer yen total");
        Ok(total)
    }

    /// Rebuild a currency's totals: due from open invoice balances, the rest
    /// from the settled payment history
    pub async fn recompute_currency(&self, code: &CurrencyCode) -> Result<RecomputedCurrencyTotals> {
        let invoices = self.store.invoices_for_currency(code).await?;
        let payments = self.store.payments_for_currency(code).await?;

        let amount_due = round2(
            invoices
                .iter()
                .filter(|i| i.is_open())
                .map(|i| i.balance)
                .sum(),
        );
        let amount_paid = round2(payments.iter().map(|p| p.allocated_amount).sum());
        let amount_in_jpy = payments.iter().map(|p| p.amount_in_jpy).sum();
        let foreign_bank_charge = round2(payments.iter().map(|p| p.foreign_bank_charge).sum());
        let local_bank_charge = round2(payments.iter().map(|p| p.local_bank_charge).sum());

        Ok(RecomputedCurrencyTotals {
            amount_due,
            amount_paid,
            amount_in_jpy,
            foreign_bank_charge,
            local_bank_charge,
        })
    }
}
