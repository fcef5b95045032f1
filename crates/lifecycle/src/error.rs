//! Lifecycle errors

use crate::status::InvoiceStatus;
use crate::transition::InvoiceEvent;
use finvoice_core::{Classify, ErrorClass};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The event is not legal from the current status. Never silently
    /// ignored; callers surface this unchanged.
    #[error("Illegal transition: {event} from {from}")]
    IllegalTransition {
        from: InvoiceStatus,
        event: InvoiceEvent,
    },

    /// Submission requires the minimal document set to be attached
    #[error("Required documents missing for submission")]
    DocumentsMissing,
}

impl Classify for LifecycleError {
    fn class(&self) -> ErrorClass {
        match self {
            LifecycleError::IllegalTransition { .. } => ErrorClass::StateConflict,
            LifecycleError::DocumentsMissing => ErrorClass::Validation,
        }
    }
}
