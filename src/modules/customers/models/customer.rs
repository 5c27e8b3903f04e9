use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, CurrencyCode, Result};

/// A billed customer.
///
/// `amount_in_jpy` is a derived cache of yen received across all of the
/// customer's payments. It is mutated only by settlement and reversal and is
/// always recomputable from payment history (see `RecomputeService`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Default invoicing currency
    pub currency: CurrencyCode,
    /// Running yen-received total (derived cache)
    pub amount_in_jpy: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String, currency: CurrencyCode) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Customer name cannot be empty"));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: None,
            phone: None,
            address: None,
            currency,
            amount_in_jpy: Decimal::ZERO,
            created_at: Utc::now(),
        })
    }
}
