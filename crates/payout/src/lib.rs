//! # Finvoice Payout
//!
//! Distributes buyer payments (or default recoveries) back to investors
//! pro-rata by their frozen share, with exact sum preservation and
//! exactly-once claims.

pub mod allocation;
pub mod config;
pub mod distributor;
pub mod error;
pub mod record;

pub use allocation::allocate;
pub use config::PayoutConfig;
pub use distributor::{PayoutDistributor, PayoutResult, Settlement};
pub use error::PayoutError;
pub use record::{ClaimSlot, PayoutRecord, SettlementKind};
