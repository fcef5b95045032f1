//! Collaborator errors

use finvoice_core::{Classify, ErrorClass};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Transient failure; the call is safe to retry with the same
    /// idempotency key
    #[error("External system unavailable: {0}")]
    Unavailable(String),

    /// The external system refused the request; retrying will not help
    #[error("External system rejected the request: {0}")]
    Rejected(String),
}

impl Classify for ConnectError {
    fn class(&self) -> ErrorClass {
        match self {
            ConnectError::Unavailable(_) => ErrorClass::ReconciliationPending,
            ConnectError::Rejected(_) => ErrorClass::StateConflict,
        }
    }
}
