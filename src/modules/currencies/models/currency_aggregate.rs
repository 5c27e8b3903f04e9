use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::CurrencyCode;

/// Per-currency running totals across all customers.
///
/// At most one aggregate record exists per code. All five totals are derived
/// caches: `amount_due` moves with invoice create/edit/delete and settlement,
/// the rest move with settlement and reversal only. None of them is
/// authoritative; `RecomputeService` rebuilds them from history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyAggregate {
    pub id: String,
    pub code: CurrencyCode,
    /// Display name, e.g. "US Dollar"
    pub name: String,
    /// Sum of open invoice balances in this currency
    pub amount_due: Decimal,
    /// Sum of allocated payment amounts
    pub amount_paid: Decimal,
    /// Accumulated yen equivalent of settled payments
    pub amount_in_jpy: Decimal,
    pub foreign_bank_charge: Decimal,
    pub local_bank_charge: Decimal,
}

impl CurrencyAggregate {
    pub fn new(code: CurrencyCode, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code,
            name,
            amount_due: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            amount_in_jpy: Decimal::ZERO,
            foreign_bank_charge: Decimal::ZERO,
            local_bank_charge: Decimal::ZERO,
        }
    }
}
