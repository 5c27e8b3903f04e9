use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, CurrencyCode, Result};

/// Caller-supplied payment fields, validated before settlement.
///
/// The yen-equivalent amount and the allocated total are not part of the
/// draft: settlement derives both itself so the persisted payment can never
/// disagree with its allocation lines.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub payment_no: String,
    pub date: NaiveDate,
    pub customer_id: String,
    pub currency: CurrencyCode,
    /// Payment amount in payment currency
    pub amount: Decimal,
    /// Yen per unit of payment currency; must be 1 for yen payments
    pub exchange_rate: Decimal,
    /// Deducted at the point of receipt, in payment currency
    pub foreign_bank_charge: Decimal,
    /// Deducted from the converted yen amount
    pub local_bank_charge: Decimal,
}

impl PaymentDraft {
    pub fn validate(&self) -> Result<()> {
        if self.payment_no.trim().is_empty() {
            return Err(AppError::validation("Payment number cannot be empty"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(AppError::validation("Payment amount must be positive"));
        }
        if self.exchange_rate <= Decimal::ZERO {
            return Err(AppError::validation("Exchange rate must be positive"));
        }
        if self.currency.is_jpy() && self.exchange_rate != Decimal::ONE {
            return Err(AppError::validation(
                "Exchange rate must be 1 for yen payments",
            ));
        }
        if self.foreign_bank_charge < Decimal::ZERO || self.local_bank_charge < Decimal::ZERO {
            return Err(AppError::validation("Bank charges cannot be negative"));
        }
        Ok(())
    }
}

/// A settled incoming payment.
///
/// Immutable after creation; deletable only through `ReversalService` and
/// only while it is the customer's most recent payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    /// Human payment number, unique across the system
    pub payment_no: String,
    pub date: NaiveDate,
    pub customer_id: String,
    pub customer_name: String,
    pub currency: CurrencyCode,
    pub amount: Decimal,
    pub exchange_rate: Decimal,
    /// Authoritative yen equivalent:
    /// floor((amount - foreign_charge) * rate) - local_charge
    pub amount_in_jpy: Decimal,
    /// Sum of non-zero allocation amounts
    pub allocated_amount: Decimal,
    pub foreign_bank_charge: Decimal,
    pub local_bank_charge: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub(crate) fn from_draft(
        draft: &PaymentDraft,
        customer_name: String,
        amount_in_jpy: Decimal,
        allocated_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payment_no: draft.payment_no.clone(),
            date: draft.date,
            customer_id: draft.customer_id.clone(),
            customer_name,
            currency: draft.currency.clone(),
            amount: draft.amount,
            exchange_rate: draft.exchange_rate,
            amount_in_jpy,
            allocated_amount,
            foreign_bank_charge: draft.foreign_bank_charge,
            local_bank_charge: draft.local_bank_charge,
            created_at: Utc::now(),
        }
    }

    /// Timestamp-derived payment number, e.g. "PAY-493021"
    pub fn generate_payment_no() -> String {
        let millis = Utc::now().timestamp_millis().to_string();
        let tail = &millis[millis.len().saturating_sub(6)..];
        format!("PAY-{}", tail)
    }
}
