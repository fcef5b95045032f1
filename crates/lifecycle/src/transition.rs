//! The transition table
//!
//! `transition` is a pure function: it validates the event against the
//! current status and returns the next status plus the side-effect
//! commands to execute. It mutates nothing and performs no I/O.

use crate::command::{Audience, Command, Notice};
use crate::error::LifecycleError;
use crate::status::InvoiceStatus;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Events that drive the invoice lifecycle.
///
/// `OpenFunding`, `RevertToListed` and `MarkFunded` are issued by the
/// investment ledger from inside its critical section, never by users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceEvent {
    /// Seller submits a complete draft for review
    SubmitForReview,
    /// Reviewer approves; requires the ownership token to be minted
    /// before the new status is committed
    Approve,
    /// Reviewer rejects
    Reject,
    /// Seller reworks a rejected invoice back into draft
    Resubmit,
    /// Approved invoice is opened for investment
    List,
    /// First reservation landed
    OpenFunding,
    /// Last active investment was cancelled
    RevertToListed,
    /// Capacity reached zero
    MarkFunded,
    /// Buyer payment covering the principal was settled
    RecordPaid,
    /// Default determination after the overdue threshold
    DetermineDefault,
    /// Seller withdraws a draft or rejected invoice
    Cancel,
}

/// Outcome of a legal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    pub commands: Vec<Command>,
}

impl Transition {
    fn new(from: InvoiceStatus, to: InvoiceStatus, commands: Vec<Command>) -> Self {
        Self { from, to, commands }
    }

    /// True when the event was legal but changes nothing (idempotent
    /// re-listing).
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.commands.is_empty()
    }
}

/// Validate `event` against `status` and produce the next status plus
/// side-effect commands.
///
/// Re-listing an invoice that is already `listed` or past it (funding,
/// funded) is the one documented no-op; every other mismatch is an
/// [`LifecycleError::IllegalTransition`].
pub fn transition(
    status: InvoiceStatus,
    event: InvoiceEvent,
) -> Result<Transition, LifecycleError> {
    use InvoiceEvent as E;
    use InvoiceStatus as S;

    let illegal = || LifecycleError::IllegalTransition {
        from: status,
        event,
    };

    let transition = match (status, event) {
        (S::Draft, E::SubmitForReview) => Transition::new(status, S::PendingReview, vec![]),

        // Token mint is a BeforeCommit command: if it fails the invoice
        // stays in pending_review and the approval is not recorded.
        (S::PendingReview, E::Approve) => Transition::new(
            status,
            S::Approved,
            vec![
                Command::MintOwnershipToken,
                Command::Notify {
                    audience: Audience::Seller,
                    notice: Notice::InvoiceApproved,
                },
            ],
        ),
        (S::PendingReview, E::Reject) => Transition::new(
            status,
            S::Rejected,
            vec![Command::Notify {
                audience: Audience::Seller,
                notice: Notice::InvoiceRejected,
            }],
        ),

        (S::Rejected, E::Resubmit) => Transition::new(status, S::Draft, vec![]),

        (S::Approved, E::List) => Transition::new(
            status,
            S::Listed,
            vec![
                Command::AnchorStatusEvent,
                Command::Notify {
                    audience: Audience::Investors,
                    notice: Notice::InvoiceListed,
                },
            ],
        ),
        // Idempotent: listing again once listed or past it changes nothing
        (S::Listed | S::Funding | S::Funded, E::List) => Transition::new(status, status, vec![]),

        (S::Listed, E::OpenFunding) => Transition::new(status, S::Funding, vec![]),
        (S::Funding, E::RevertToListed) => Transition::new(status, S::Listed, vec![]),

        (S::Listed | S::Funding, E::MarkFunded) => Transition::new(
            status,
            S::Funded,
            vec![
                Command::AnchorStatusEvent,
                Command::Notify {
                    audience: Audience::Investors,
                    notice: Notice::FullyFunded,
                },
            ],
        ),

        (S::Funded, E::RecordPaid) => Transition::new(
            status,
            S::Paid,
            vec![
                Command::AnchorStatusEvent,
                Command::Notify {
                    audience: Audience::Investors,
                    notice: Notice::PayoutAvailable,
                },
            ],
        ),

        (S::Listed | S::Funding | S::Funded, E::DetermineDefault) => Transition::new(
            status,
            S::Defaulted,
            vec![
                Command::AnchorStatusEvent,
                Command::Notify {
                    audience: Audience::Investors,
                    notice: Notice::DefaultDetermined,
                },
            ],
        ),

        (S::Draft | S::Rejected, E::Cancel) => Transition::new(status, S::Cancelled, vec![]),

        _ => return Err(illegal()),
    };

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandPhase;

    #[test]
    fn test_happy_path_to_paid() {
        let path = [
            (InvoiceStatus::Draft, InvoiceEvent::SubmitForReview),
            (InvoiceStatus::PendingReview, InvoiceEvent::Approve),
            (InvoiceStatus::Approved, InvoiceEvent::List),
            (InvoiceStatus::Listed, InvoiceEvent::OpenFunding),
            (InvoiceStatus::Funding, InvoiceEvent::MarkFunded),
            (InvoiceStatus::Funded, InvoiceEvent::RecordPaid),
        ];

        let mut status = InvoiceStatus::Draft;
        for (expected_from, event) in path {
            assert_eq!(status, expected_from);
            status = transition(status, event).unwrap().to;
        }
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_approve_emits_mint_before_commit() {
        let t = transition(InvoiceStatus::PendingReview, InvoiceEvent::Approve).unwrap();
        assert_eq!(t.to, InvoiceStatus::Approved);
        assert_eq!(t.commands[0], Command::MintOwnershipToken);
        assert_eq!(t.commands[0].phase(), CommandPhase::BeforeCommit);
    }

    #[test]
    fn test_listing_is_idempotent() {
        for status in [
            InvoiceStatus::Listed,
            InvoiceStatus::Funding,
            InvoiceStatus::Funded,
        ] {
            let t = transition(status, InvoiceEvent::List).unwrap();
            assert!(t.is_noop(), "re-listing from {status} should be a no-op");
        }
    }

    #[test]
    fn test_investing_states_cannot_be_reapproved() {
        let result = transition(InvoiceStatus::Paid, InvoiceEvent::Approve);
        assert!(matches!(
            result,
            Err(LifecycleError::IllegalTransition {
                from: InvoiceStatus::Paid,
                event: InvoiceEvent::Approve,
            })
        ));
    }

    #[test]
    fn test_draft_cannot_be_funded() {
        let result = transition(InvoiceStatus::Draft, InvoiceEvent::MarkFunded);
        assert!(matches!(
            result,
            Err(LifecycleError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn test_default_from_each_exposed_state() {
        for status in [
            InvoiceStatus::Listed,
            InvoiceStatus::Funding,
            InvoiceStatus::Funded,
        ] {
            let t = transition(status, InvoiceEvent::DetermineDefault).unwrap();
            assert_eq!(t.to, InvoiceStatus::Defaulted);
        }
        assert!(transition(InvoiceStatus::Paid, InvoiceEvent::DetermineDefault).is_err());
        assert!(transition(InvoiceStatus::Draft, InvoiceEvent::DetermineDefault).is_err());
    }

    #[test]
    fn test_rejected_can_be_reworked_or_cancelled() {
        let t = transition(InvoiceStatus::Rejected, InvoiceEvent::Resubmit).unwrap();
        assert_eq!(t.to, InvoiceStatus::Draft);

        let t = transition(InvoiceStatus::Rejected, InvoiceEvent::Cancel).unwrap();
        assert_eq!(t.to, InvoiceStatus::Cancelled);
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for status in [
            InvoiceStatus::Paid,
            InvoiceStatus::Defaulted,
            InvoiceStatus::Cancelled,
        ] {
            for event in [
                InvoiceEvent::SubmitForReview,
                InvoiceEvent::Approve,
                InvoiceEvent::List,
                InvoiceEvent::MarkFunded,
                InvoiceEvent::RecordPaid,
                InvoiceEvent::DetermineDefault,
                InvoiceEvent::Cancel,
            ] {
                assert!(
                    transition(status, event).is_err(),
                    "{event} from {status} should be illegal"
                );
            }
        }
    }

    #[test]
    fn test_funded_notice_goes_to_investors() {
        let t = transition(InvoiceStatus::Funding, InvoiceEvent::MarkFunded).unwrap();
        assert!(t.commands.contains(&Command::Notify {
            audience: Audience::Investors,
            notice: Notice::FullyFunded,
        }));
    }
}
