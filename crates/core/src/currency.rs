//! Currency - Type-safe trade currency codes
//!
//! Trade invoices are denominated in fiat settlement currencies.
//! Common currencies are pre-defined; anything else uses the `Other`
//! fallback so an unknown code never fails invoice creation (the risk
//! engine prices the unfamiliarity instead).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing currencies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Empty currency code")]
    EmptyCode,

    #[error("Currency code too long (max 10 chars): {0}")]
    TooLong(String),

    #[error("Invalid currency code format: {0}")]
    InvalidFormat(String),
}

/// Settlement currency of an invoice.
///
/// # Examples
/// ```
/// use finvoice_core::Currency;
///
/// let usd: Currency = "USD".parse().unwrap();
/// assert_eq!(usd, Currency::Usd);
/// assert_eq!(usd.minor_unit_scale(), 2);
///
/// // Unknown codes are carried through
/// let custom: Currency = "XOF".parse().unwrap();
/// assert!(matches!(custom, Currency::Other(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// British Pound
    Gbp,
    /// Japanese Yen
    Jpy,
    /// Chinese Yuan
    Cny,
    /// Indian Rupee
    Inr,
    /// UAE Dirham
    Aed,
    /// Singapore Dollar
    Sgd,
    /// Swiss Franc
    Chf,
    /// Nigerian Naira
    Ngn,
    /// Any other ISO-style code
    Other(String),
}

impl Currency {
    /// Returns the currency code as a string slice
    pub fn code(&self) -> &str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cny => "CNY",
            Currency::Inr => "INR",
            Currency::Aed => "AED",
            Currency::Sgd => "SGD",
            Currency::Chf => "CHF",
            Currency::Ngn => "NGN",
            Currency::Other(s) => s.as_str(),
        }
    }

    /// Decimal places of the currency's minor unit.
    ///
    /// JPY has no minor unit; everything else here settles in hundredths.
    pub fn minor_unit_scale(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(CurrencyError::EmptyCode);
        }

        if s.len() > 10 {
            return Err(CurrencyError::TooLong(s));
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CurrencyError::InvalidFormat(s));
        }

        Ok(match s.as_str() {
            "USD" => Currency::Usd,
            "EUR" => Currency::Eur,
            "GBP" => Currency::Gbp,
            "JPY" => Currency::Jpy,
            "CNY" => Currency::Cny,
            "INR" => Currency::Inr,
            "AED" => Currency::Aed,
            "SGD" => Currency::Sgd,
            "CHF" => Currency::Chf,
            "NGN" => Currency::Ngn,
            _ => Currency::Other(s),
        })
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_currencies() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("Jpy".parse::<Currency>().unwrap(), Currency::Jpy);
    }

    #[test]
    fn test_parse_custom_code() {
        let custom: Currency = "XOF".parse().unwrap();
        assert_eq!(custom, Currency::Other("XOF".to_string()));
        assert_eq!(custom.to_string(), "XOF");
    }

    #[test]
    fn test_minor_unit_scale() {
        assert_eq!(Currency::Usd.minor_unit_scale(), 2);
        assert_eq!(Currency::Jpy.minor_unit_scale(), 0);
        assert_eq!(Currency::Other("XOF".into()).minor_unit_scale(), 2);
    }

    #[test]
    fn test_empty_code_error() {
        let result: Result<Currency, _> = "".parse();
        assert!(matches!(result, Err(CurrencyError::EmptyCode)));
    }

    #[test]
    fn test_too_long_error() {
        let result: Result<Currency, _> = "VERYLONGCURRENCYNAME".parse();
        assert!(matches!(result, Err(CurrencyError::TooLong(_))));
    }

    #[test]
    fn test_invalid_format_error() {
        let result: Result<Currency, _> = "US-D".parse();
        assert!(matches!(result, Err(CurrencyError::InvalidFormat(_))));
    }

    #[test]
    fn test_serde_roundtrip() {
        for currency in [Currency::Usd, Currency::Jpy, Currency::Other("XOF".into())] {
            let json = serde_json::to_string(&currency).unwrap();
            let parsed: Currency = serde_json::from_str(&json).unwrap();
            assert_eq!(currency, parsed);
        }
    }
}
