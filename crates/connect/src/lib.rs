//! # Finvoice Connect
//!
//! Traits for the external systems the platform talks to (document
//! vault, settlement network, notifications), in-memory mocks with
//! scriptable failures for tests, and the reconciliation queue that
//! retries external calls which failed after a local commit.

pub mod error;
pub mod mock;
pub mod reconcile;
pub mod traits;

pub use error::ConnectError;
pub use mock::{MockDocumentVault, MockNotifier, MockSettlementNetwork};
pub use reconcile::{ExternalCall, PendingCall, ReconciliationQueue};
pub use traits::{DocumentVault, Notifier, Receipt, SettlementNetwork, TokenRef};
