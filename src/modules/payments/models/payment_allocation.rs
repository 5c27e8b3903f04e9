use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::CurrencyCode;

/// The persisted portion of a payment assigned to one invoice.
///
/// One record per (payment, invoice) pair with a non-zero allocation.
/// Created by settlement, deleted as a unit with its payment by reversal,
/// never edited in between. The exchange rate is snapshotted so reversal and
/// recompute do not depend on the payment record's mutability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub id: String,
    pub payment_id: String,
    pub invoice_id: String,
    /// Cached for display
    pub invoice_no: String,
    /// Amount in payment currency
    pub allocated_amount: Decimal,
    /// Whole-yen share, including any rounding residual on the primary line
    pub received_jpy: Decimal,
    /// Full payment charges on the primary line, zero elsewhere
    pub foreign_bank_charge: Decimal,
    pub local_bank_charge: Decimal,
    pub exchange_rate: Decimal,
    pub currency: CurrencyCode,
    pub created_at: DateTime<Utc>,
}

impl PaymentAllocation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payment_id: String,
        invoice_id: String,
        invoice_no: String,
        allocated_amount: Decimal,
        received_jpy: Decimal,
        foreign_bank_charge: Decimal,
        local_bank_charge: Decimal,
        exchange_rate: Decimal,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payment_id,
            invoice_id,
            invoice_no,
            allocated_amount,
            received_jpy,
            foreign_bank_charge,
            local_bank_charge,
            exchange_rate,
            currency,
            created_at: Utc::now(),
        }
    }
}
