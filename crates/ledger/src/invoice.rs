//! Invoice aggregate

use chrono::{DateTime, Duration, Utc};
use finvoice_core::{Amount, BasisPoints, Currency, InvoiceId};
use finvoice_lifecycle::{transition, InvoiceEvent, InvoiceStatus, PaymentStatus, Transition};
use finvoice_risk::RiskAssessment;
use serde::{Deserialize, Serialize};

/// Seller-supplied fields of a new invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub seller_id: String,
    pub buyer_name: String,
    pub principal: Amount,
    pub currency: Currency,
    /// Days until the buyer is expected to pay
    pub tenor_days: u32,
    /// Quoted yield offered to investors
    pub quoted_yield: BasisPoints,
    /// Target raise; defaults to the principal
    pub funding_goal: Option<Amount>,
    pub industry: Option<String>,
}

/// A trade invoice being financed.
///
/// `total_invested` is authoritative only inside the ledger's per-invoice
/// critical section; reads outside it are snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub seller_id: String,
    pub buyer_name: String,
    pub principal: Amount,
    pub currency: Currency,
    pub tenor_days: u32,
    pub quoted_yield: BasisPoints,
    pub funding_goal: Amount,
    pub total_invested: Amount,
    /// Attached at creation; recomputed only on explicit re-assessment
    /// while still draft/pending_review
    pub risk: RiskAssessment,
    pub status: InvoiceStatus,
    pub paid_amount: Amount,
    pub payment_status: PaymentStatus,
    pub maturity_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every committed mutation
    pub version: u64,
}

impl Invoice {
    /// Create a draft invoice with its initial risk assessment attached.
    pub fn create(draft: InvoiceDraft, risk: RiskAssessment, now: DateTime<Utc>) -> Self {
        let funding_goal = draft.funding_goal.unwrap_or(draft.principal);
        Self {
            id: InvoiceId::new(),
            seller_id: draft.seller_id,
            buyer_name: draft.buyer_name,
            principal: draft.principal,
            currency: draft.currency,
            tenor_days: draft.tenor_days,
            quoted_yield: draft.quoted_yield,
            funding_goal,
            total_invested: Amount::ZERO,
            risk,
            status: InvoiceStatus::Draft,
            paid_amount: Amount::ZERO,
            payment_status: PaymentStatus::Unpaid,
            maturity_date: now + Duration::days(draft.tenor_days as i64),
            created_at: now,
            version: 0,
        }
    }

    /// Capacity still open to investors.
    pub fn remaining_capacity(&self) -> Amount {
        self.funding_goal
            .checked_sub(&self.total_invested)
            .unwrap_or(Amount::ZERO)
    }

    pub fn is_fully_funded(&self) -> bool {
        self.total_invested == self.funding_goal
    }

    /// Replace the risk assessment. Only legal while the invoice can
    /// still be reworked.
    pub fn reassess(&mut self, risk: RiskAssessment) -> bool {
        if matches!(
            self.status,
            InvoiceStatus::Draft | InvoiceStatus::PendingReview
        ) {
            self.risk = risk;
            self.version += 1;
            true
        } else {
            false
        }
    }

    /// Apply a lifecycle event, recording the new status and bumping the
    /// version. Returns the transition so the caller can execute its
    /// commands.
    pub fn apply(
        &mut self,
        event: InvoiceEvent,
    ) -> Result<Transition, finvoice_lifecycle::LifecycleError> {
        let transition = transition(self.status, event)?;
        if !transition.is_noop() {
            self.status = transition.to;
            self.version += 1;
        }
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finvoice_risk::{RiskEngine, RiskInput};
    use rust_decimal_macros::dec;

    fn assessment() -> RiskAssessment {
        RiskEngine::new().assess(&RiskInput {
            principal: Amount::from_major(10_000),
            currency: Currency::Usd,
            tenor_days: 60,
            quoted_yield: BasisPoints(800),
            industry: None,
            seller_history: None,
            buyer_history: None,
            market: None,
        })
    }

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            seller_id: "seller-1".into(),
            buyer_name: "Acme GmbH".into(),
            principal: Amount::from_major(10_000),
            currency: Currency::Usd,
            tenor_days: 60,
            quoted_yield: BasisPoints(800),
            funding_goal: None,
            industry: None,
        }
    }

    #[test]
    fn test_goal_defaults_to_principal() {
        let invoice = Invoice::create(draft(), assessment(), Utc::now());
        assert_eq!(invoice.funding_goal, invoice.principal);
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.remaining_capacity(), invoice.principal);
    }

    #[test]
    fn test_maturity_follows_tenor() {
        let now = Utc::now();
        let invoice = Invoice::create(draft(), assessment(), now);
        assert_eq!(invoice.maturity_date, now + Duration::days(60));
    }

    #[test]
    fn test_apply_bumps_version() {
        let mut invoice = Invoice::create(draft(), assessment(), Utc::now());
        assert_eq!(invoice.version, 0);
        invoice.apply(InvoiceEvent::SubmitForReview).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::PendingReview);
        assert_eq!(invoice.version, 1);
    }

    #[test]
    fn test_noop_does_not_bump_version() {
        let mut invoice = Invoice::create(draft(), assessment(), Utc::now());
        invoice.apply(InvoiceEvent::SubmitForReview).unwrap();
        invoice.apply(InvoiceEvent::Approve).unwrap();
        invoice.apply(InvoiceEvent::List).unwrap();
        let version = invoice.version;
        // Idempotent re-list
        invoice.apply(InvoiceEvent::List).unwrap();
        assert_eq!(invoice.version, version);
    }

    #[test]
    fn test_reassess_only_while_reworkable() {
        let mut invoice = Invoice::create(draft(), assessment(), Utc::now());
        assert!(invoice.reassess(assessment()));

        invoice.apply(InvoiceEvent::SubmitForReview).unwrap();
        assert!(invoice.reassess(assessment()));

        invoice.apply(InvoiceEvent::Approve).unwrap();
        assert!(!invoice.reassess(assessment()));
    }

    #[test]
    fn test_remaining_capacity_math() {
        let mut invoice = Invoice::create(draft(), assessment(), Utc::now());
        invoice.total_invested = Amount::new(dec!(4000)).unwrap();
        assert_eq!(invoice.remaining_capacity().value(), dec!(6000));
        assert!(!invoice.is_fully_funded());
    }
}
