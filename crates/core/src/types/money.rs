//! Monetary amounts using decimal arithmetic.
//!
//! Remote platforms report prices and totals either as JSON strings
//! (`"19.99"`) or as JSON numbers (`19.99`). [`RawAmount`] captures both forms
//! and converts them into [`Decimal`] without passing through floating point.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid amount: {0:?}")]
    Invalid(String),
}

/// An amount as received from a remote API, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// String form, e.g. `"19.99"`.
    Text(String),
    /// Numeric form, e.g. `19.99`.
    Number(serde_json::Number),
}

impl RawAmount {
    /// Convert to a [`Decimal`].
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if the value is empty or not a decimal number.
    pub fn to_decimal(&self) -> Result<Decimal, AmountError> {
        match self {
            Self::Text(s) => parse_amount(s),
            Self::Number(n) => parse_amount(&n.to_string()),
        }
    }
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Parse a decimal amount such as `"19.99"`, `"-5"` or `"1.5e2"`.
///
/// # Errors
///
/// Returns [`AmountError::Empty`] for blank input and
/// [`AmountError::Invalid`] for anything that is not a decimal number.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use storesync_core::parse_amount;
///
/// assert_eq!(parse_amount("19.99").unwrap(), Decimal::new(1999, 2));
/// assert!(parse_amount("free").is_err());
/// ```
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AmountError::Invalid(trimmed.to_owned()))
}
