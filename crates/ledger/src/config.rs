//! Ledger policy configuration
//!
//! Minimum-investment rules and the cancellation window are platform
//! policy, not law; they live here with defaults so tests and
//! deployments can tune them.

use finvoice_core::Amount;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Absolute floor on a single investment
    pub min_investment_floor: Amount,

    /// Minimum as a fraction of invoice principal; the effective minimum
    /// is the greater of this and the floor
    pub min_investment_pct: Decimal,

    /// Hours after creation during which an active investment may be
    /// cancelled
    pub cancellation_window_hours: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_investment_floor: Amount::new_unchecked(dec!(100)),
            min_investment_pct: dec!(0.01),
            cancellation_window_hours: 24,
        }
    }
}

impl LedgerConfig {
    /// Effective per-investment minimum for an invoice principal.
    pub fn min_investment(&self, principal: Amount) -> Amount {
        let pct_minimum = principal.value() * self.min_investment_pct;
        Amount::new_unchecked(pct_minimum.max(self.min_investment_floor.value()))
    }
}
