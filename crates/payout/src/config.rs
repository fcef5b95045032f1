//! Payout policy configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// Days past maturity before a default may be determined
    pub default_grace_days: i64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            default_grace_days: 30,
        }
    }
}
