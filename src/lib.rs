//! Multi-currency invoicing core.
//!
//! Customers are invoiced in their own currency; incoming payments are
//! distributed across outstanding invoices oldest-first, with bank charges
//! and yen-equivalent bookkeeping tracked per invoice, per customer, and per
//! currency. The library exposes the allocation, settlement, and reversal
//! engines behind a storage collaborator trait; HTTP/UI layers live outside.

pub mod config;
pub mod core;
pub mod modules;
pub mod storage;

// Re-export commonly used types
pub use core::{AppError, CurrencyCode, LedgerStore, Result, WriteOp};
pub use modules::invoices;
pub use modules::payments;
