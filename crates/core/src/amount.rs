//! Amount - Non-negative decimal wrapper for financial amounts
//!
//! All monetary amounts in Finvoice MUST be non-negative.
//! This is enforced at the type level.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),
}

/// A non-negative decimal amount for financial operations.
///
/// # Invariant
/// The inner value is always >= 0. This is enforced by the constructor.
///
/// # Example
/// ```
/// use finvoice_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
///
/// // Negative amounts are rejected
/// let negative = Amount::new(Decimal::new(-100, 0));
/// assert!(negative.is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            Err(AmountError::NegativeAmount(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Create an Amount from whole major units (e.g. dollars).
    pub fn from_major(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Create an Amount without validation.
    ///
    /// # Safety
    /// The caller MUST ensure the value is non-negative.
    /// Use only for trusted sources (e.g., deserialization from validated storage).
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if the result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }

    /// Multiply by a non-negative ratio (e.g. a pro-rata share).
    ///
    /// Returns None if the ratio is negative or the product overflows.
    pub fn checked_mul_ratio(&self, ratio: Decimal) -> Option<Amount> {
        if ratio < Decimal::ZERO {
            return None;
        }
        self.0.checked_mul(ratio).map(Amount)
    }

    /// Round down to `scale` decimal places (minor units of a currency).
    ///
    /// Payout allocation rounds each claim toward zero so that the sum of
    /// rounded claims never exceeds the total being distributed; the
    /// leftover minor units are handed out separately.
    pub fn floor_to_scale(&self, scale: u32) -> Amount {
        Amount(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::ToZero),
        )
    }

    /// Number of minor units at the given scale, if representable as u128.
    pub fn minor_units(&self, scale: u32) -> Option<u128> {
        let scaled = self.0.checked_mul(Decimal::from(10u64.pow(scale)))?;
        scaled.trunc().to_u128()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100)).unwrap();
        assert_eq!(amount.value(), dec!(100));
    }

    #[test]
    fn test_amount_zero() {
        let amount = Amount::new(Decimal::ZERO).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_amount_negative_rejected() {
        let result = Amount::new(dec!(-100));
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        let a = Amount::new(dec!(50)).unwrap();
        let b = Amount::new(dec!(100)).unwrap();
        assert!(a.checked_sub(&b).is_none());
    }

    #[test]
    fn test_checked_sub_success() {
        let a = Amount::new(dec!(100)).unwrap();
        let b = Amount::new(dec!(30)).unwrap();
        let result = a.checked_sub(&b).unwrap();
        assert_eq!(result.value(), dec!(70));
    }

    #[test]
    fn test_mul_ratio() {
        let a = Amount::new(dec!(9800)).unwrap();
        let claim = a.checked_mul_ratio(dec!(0.4)).unwrap();
        assert_eq!(claim.value(), dec!(3920.0));
    }

    #[test]
    fn test_mul_ratio_rejects_negative() {
        let a = Amount::new(dec!(100)).unwrap();
        assert!(a.checked_mul_ratio(dec!(-0.5)).is_none());
    }

    #[test]
    fn test_floor_to_scale() {
        let a = Amount::new(dec!(3333.33999)).unwrap();
        assert_eq!(a.floor_to_scale(2).value(), dec!(3333.33));
        let b = Amount::new(dec!(10)).unwrap();
        assert_eq!(b.floor_to_scale(2).value(), dec!(10));
    }

    #[test]
    fn test_minor_units() {
        let a = Amount::new(dec!(123.45)).unwrap();
        assert_eq!(a.minor_units(2), Some(12345));
        let b = Amount::new(dec!(1000)).unwrap();
        assert_eq!(b.minor_units(0), Some(1000));
    }

    #[test]
    fn test_serde_roundtrip() {
        let amount = Amount::new(dec!(123.45)).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        let parsed: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, parsed);
    }
}
