use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO-style currency code (e.g. "USD", "JPY").
///
/// Currencies are data here, not a closed enum: each code owns at most one
/// aggregate record, and invoices/payments/customers reference codes by
/// value. Codes are uppercase ASCII letters, 1 to 8 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and validate a currency code, normalizing to uppercase
    pub fn new(code: impl AsRef<str>) -> Result<Self, String> {
        let code = code.as_ref().trim().to_uppercase();
        if code.is_empty() || code.len() > 8 {
            return Err(format!("Invalid currency code length: '{}'", code));
        }
        if !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(format!("Currency code must be ASCII letters: '{}'", code));
        }
        Ok(CurrencyCode(code))
    }

    /// Japanese yen, the reporting reference currency
    pub fn jpy() -> Self {
        CurrencyCode("JPY".to_string())
    }

    /// Yen payments must carry an exchange rate of exactly 1
    pub fn is_jpy(&self) -> bool {
        self.0 == "JPY"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}
