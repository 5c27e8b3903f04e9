use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of an allocation plan: the portion of a payment proposed for one
/// invoice. Produced by `AllocationEngine`, consumed (and re-validated)
/// by `SettlementService`; never persisted as-is.
///
/// Every open invoice appears in the plan, zero-allocation rows included, so
/// a caller can display the whole open set. The `is_primary` flag marks the
/// single line that carries the payment's bank charges and the yen rounding
/// residual; the contract is explicit here rather than implied by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub invoice_id: String,
    /// Amount assigned to this invoice, in payment currency (possibly zero)
    pub allocated_amount: Decimal,
    /// The invoice's balance before this allocation, kept for validation
    pub balance: Decimal,
    pub foreign_bank_charge: Decimal,
    pub local_bank_charge: Decimal,
    /// Whole-yen share of this line
    pub received_jpy: Decimal,
    /// True on the first non-zero line only
    pub is_primary: bool,
}

impl AllocationLine {
    pub fn is_allocated(&self) -> bool {
        self.allocated_amount > Decimal::ZERO
    }
}
