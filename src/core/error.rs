use std::fmt;

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
///
/// Every engine failure maps onto exactly one of these categories so callers
/// can react appropriately (form error vs. disabled action vs. retry).
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Precondition violated before any mutation (amount mismatch,
    /// over-allocation, missing required field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced record vanished between read and intended write
    #[error("Not found: {0}")]
    NotFound(String),

    /// Reversal refused: only the customer's most recent payment may be
    /// deleted, otherwise running balances desynchronize from history
    #[error("Payment {0} is not the latest payment for its customer")]
    NotLatestPayment(String),

    /// Database operation errors (atomic commit failure included)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// True when the failure left no observable state change and the caller
    /// may retry after fixing the input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::NotLatestPayment(_)
        )
    }
}

/// Distinct message category per failure kind, for UI dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    MissingRecord,
    StalePayment,
    StorageFailure,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Validation(_) => ErrorCategory::InvalidInput,
            AppError::NotFound(_) => ErrorCategory::MissingRecord,
            AppError::NotLatestPayment(_) => ErrorCategory::StalePayment,
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                ErrorCategory::StorageFailure
            }
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::InvalidInput => write!(f, "invalid_input"),
            ErrorCategory::MissingRecord => write!(f, "missing_record"),
            ErrorCategory::StalePayment => write!(f, "stale_payment"),
            ErrorCategory::StorageFailure => write!(f, "storage_failure"),
        }
    }
}
