//! Side-effect commands emitted by transitions
//!
//! A transition returns the commands to run instead of running them, so
//! the state machine stays pure and the orchestrator decides ordering:
//! `BeforeCommit` commands must succeed before the new status is
//! recorded; `AfterCommit` commands are best-effort and must never run
//! inside a locked section.

use serde::{Deserialize, Serialize};

/// When the orchestrator must execute a command relative to committing
/// the status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandPhase {
    /// Must succeed first; failure aborts the transition (no partial state)
    BeforeCommit,
    /// Fire after the local commit; failure goes to reconciliation
    AfterCommit,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Seller,
    Investors,
}

/// What happened, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    InvoiceApproved,
    InvoiceRejected,
    InvoiceListed,
    FullyFunded,
    PayoutAvailable,
    DefaultDetermined,
}

/// A side effect the orchestrator must execute for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Request the fractional-ownership token from the settlement network
    MintOwnershipToken,
    /// Anchor the status change on the settlement network
    AnchorStatusEvent,
    /// Fire-and-forget notification
    Notify { audience: Audience, notice: Notice },
}

impl Command {
    pub fn phase(&self) -> CommandPhase {
        match self {
            // Approval is only recorded once the token exists
            Command::MintOwnershipToken => CommandPhase::BeforeCommit,
            Command::AnchorStatusEvent | Command::Notify { .. } => CommandPhase::AfterCommit,
        }
    }
}
