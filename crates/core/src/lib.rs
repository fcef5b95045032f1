//! Finvoice core domain types
//!
//! Shared building blocks for the invoice funding ledger:
//! - [`Amount`]: non-negative decimal money
//! - [`Currency`]: trade currency codes with minor-unit scale
//! - Identity newtypes ([`InvoiceId`], [`InvestorId`], [`InvestmentId`])
//! - [`Clock`]: injectable time source so windows and maturity checks
//!   are testable without sleeping

pub mod amount;
pub mod clock;
pub mod currency;
pub mod ids;

pub use amount::{Amount, AmountError};
pub use clock::{Clock, FixedClock, SystemClock};
pub use currency::{Currency, CurrencyError};
pub use ids::{InvestmentId, InvestorId, InvoiceId};

/// Errors that can classify themselves into the shared taxonomy.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}

use rust_decimal::Decimal;

/// Coarse classification of domain errors.
///
/// Callers branch on the class, not the concrete variant: validation
/// failures are locally recoverable, state conflicts must not be blindly
/// retried (retrying without new information repeats the conflict), and
/// reconciliation-pending outcomes are not user-facing failures at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed or out-of-range input; surface to the caller unchanged
    Validation,
    /// Illegal lifecycle transition, exhausted capacity, duplicate actor;
    /// never auto-retried
    StateConflict,
    /// Local state committed but an external call failed; queued for
    /// out-of-band retry
    ReconciliationPending,
}

/// Basis points (1 bps = 0.01%).
///
/// Quoted yields and yield adjustments are expressed in basis points to
/// avoid fractional-percent ambiguity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct BasisPoints(pub i64);

impl BasisPoints {
    pub const ZERO: Self = Self(0);

    /// Convert to a decimal rate, e.g. 850 bps -> 0.085
    pub fn as_rate(&self) -> Decimal {
        Decimal::new(self.0, 4)
    }
}

impl std::fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}bps", self.0)
    }
}
