//! Finvoice invoice lifecycle
//!
//! The finite-state machine governing an invoice's status. Transitions
//! are a pure function of (current status, event) returning the next
//! status plus the side-effect commands the orchestrator must execute
//! around the commit.

pub mod command;
pub mod error;
pub mod status;
pub mod transition;

pub use command::{Audience, Command, CommandPhase, Notice};
pub use error::LifecycleError;
pub use status::{InvoiceStatus, PaymentStatus};
pub use transition::{transition, InvoiceEvent, Transition};
