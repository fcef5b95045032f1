//! Invoice status definitions

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle status of an invoice.
///
/// `Listed` and `Funding` are both investable; the split exists so
/// observers can tell an untouched listing from one that is partially
/// funded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being drafted by the seller; fields still mutable
    Draft,
    /// Submitted with required documents, awaiting review
    PendingReview,
    /// Review passed and ownership token minted
    Approved,
    /// Review failed; may be reworked back to draft
    Rejected,
    /// Open for investment, nothing committed yet
    Listed,
    /// Open for investment with at least one active investment
    Funding,
    /// Funding goal reached; waiting on the buyer
    Funded,
    /// Buyer paid in full and payout was distributed
    Paid,
    /// Default determined and recovery distributed
    Defaulted,
    /// Withdrawn before ever being listed
    Cancelled,
}

impl InvoiceStatus {
    /// Can investors reserve capacity right now?
    pub fn is_investable(&self) -> bool {
        matches!(self, InvoiceStatus::Listed | InvoiceStatus::Funding)
    }

    /// Can a default determination still be made?
    pub fn can_default(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Listed | InvoiceStatus::Funding | InvoiceStatus::Funded
        )
    }

    /// No further transitions leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Paid | InvoiceStatus::Defaulted | InvoiceStatus::Cancelled
        )
    }
}

/// Payment progress tracked alongside the lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing received from the buyer yet
    #[default]
    Unpaid,
    /// Paid in full
    Paid,
    /// Recovery distributed after default
    Recovered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_investable_states() {
        assert!(InvoiceStatus::Listed.is_investable());
        assert!(InvoiceStatus::Funding.is_investable());
        assert!(!InvoiceStatus::Draft.is_investable());
        assert!(!InvoiceStatus::Funded.is_investable());
        assert!(!InvoiceStatus::Paid.is_investable());
    }

    #[test]
    fn test_defaultable_states() {
        assert!(InvoiceStatus::Funded.can_default());
        assert!(InvoiceStatus::Funding.can_default());
        assert!(!InvoiceStatus::Paid.can_default());
        assert!(!InvoiceStatus::Draft.can_default());
    }

    #[test]
    fn test_terminal_states() {
        assert!(InvoiceStatus::Paid.is_terminal());
        assert!(InvoiceStatus::Defaulted.is_terminal());
        assert!(InvoiceStatus::Cancelled.is_terminal());
        assert!(!InvoiceStatus::Funded.is_terminal());
    }

    #[test]
    fn test_snake_case_serde() {
        let json = serde_json::to_string(&InvoiceStatus::PendingReview).unwrap();
        assert_eq!(json, "\"pending_review\"");
        assert_eq!(InvoiceStatus::PendingReview.to_string(), "pending_review");
    }
}
