// Invoice model and the balance-driven status state machine.
//
// An invoice is created pending with balance == total and amount_paid == 0.
// After creation it is mutated only by settlement/reversal allocation
// application; edits and deletes are allowed while pending only.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, CurrencyCode, Result};

/// Invoice status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// No payment received yet
    #[serde(rename = "pending")]
    Pending,

    /// Some balance remains after partial payment
    #[serde(rename = "partially_paid")]
    PartiallyPaid,

    /// Balance fully settled
    #[serde(rename = "paid")]
    Paid,
}

impl InvoiceStatus {
    /// The single state-machine rule shared by settlement and reversal:
    /// status is a pure function of balance.
    ///
    /// `balance == 0` => paid, `balance == total` => pending, otherwise
    /// partially paid. A reversal can move a paid invoice back through
    /// partially_paid to pending.
    pub fn for_balance(balance: Decimal, total: Decimal) -> Self {
        if balance.is_zero() {
            InvoiceStatus::Paid
        } else if balance == total {
            InvoiceStatus::Pending
        } else {
            InvoiceStatus::PartiallyPaid
        }
    }

    /// Open invoices still owe money and are eligible for allocation
    pub fn is_open(&self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::PartiallyPaid)
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::PartiallyPaid => write!(f, "partially_paid"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "partially_paid" => Ok(InvoiceStatus::PartiallyPaid),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// A customer invoice in one currency.
///
/// Invariant after every mutation: `balance == total_amount - amount_paid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    /// Human invoice number, unique across the system
    pub invoice_no: String,
    pub customer_id: String,
    /// Cached for display; the customer record stays authoritative
    pub customer_name: String,
    pub currency: CurrencyCode,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    /// Yen received against this invoice (derived cache)
    pub received_jpy: Decimal,
    /// Bank charge totals accrued by allocations touching this invoice
    pub foreign_bank_charge: Decimal,
    pub local_bank_charge: Decimal,
    pub status: InvoiceStatus,
    /// Issue date
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a pending invoice with balance equal to the total
    pub fn new(
        invoice_no: String,
        customer_id: String,
        customer_name: String,
        currency: CurrencyCode,
        total_amount: Decimal,
        date: NaiveDate,
    ) -> Result<Self> {
        if invoice_no.trim().is_empty() {
            return Err(AppError::validation("Invoice number cannot be empty"));
        }
        if total_amount <= Decimal::ZERO {
            return Err(AppError::validation(
                "Invoice total amount must be positive",
            ));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            invoice_no,
            customer_id,
            customer_name,
            currency,
            total_amount,
            amount_paid: Decimal::ZERO,
            balance: total_amount,
            received_jpy: Decimal::ZERO,
            foreign_bank_charge: Decimal::ZERO,
            local_bank_charge: Decimal::ZERO,
            status: InvoiceStatus::Pending,
            date,
            created_at: Utc::now(),
        })
    }

    /// An invoice may be edited or deleted only before any payment touched it
    pub fn is_mutable(&self) -> bool {
        self.status == InvoiceStatus::Pending
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
