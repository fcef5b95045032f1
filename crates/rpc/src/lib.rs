//! # Finvoice RPC
//!
//! The orchestrator that wires the risk engine, investment ledger,
//! payout distributor and external collaborators together, plus the
//! `finvoice` command-line binary.

pub mod context;
pub mod error;

pub use context::{AppContext, RiskContext};
pub use error::AppError;
