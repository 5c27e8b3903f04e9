pub mod currency;
pub mod error;
pub mod money;
pub mod traits;

pub use currency::CurrencyCode;
pub use error::{AppError, Result};
pub use traits::{LedgerStore, WriteOp};
