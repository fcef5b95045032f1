//! Per-invoice funding book
//!
//! One book holds one invoice and all investments against it. A book is
//! only ever touched under its own lock (see `ledger.rs`), so its
//! methods can mutate freely.

use crate::investment::{Investment, InvestmentStatus};
use crate::invoice::Invoice;
use finvoice_core::{InvestmentId, InvestorId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceBook {
    pub invoice: Invoice,
    pub investments: HashMap<InvestmentId, Investment>,
    /// Set under the book lock when a payout record is committed;
    /// settlement happens at most once per invoice
    pub settled: bool,
}

impl InvoiceBook {
    pub fn new(invoice: Invoice) -> Self {
        Self {
            invoice,
            investments: HashMap::new(),
            settled: false,
        }
    }

    /// All investments still counting against capacity.
    pub fn active_investments(&self) -> impl Iterator<Item = &Investment> {
        self.investments
            .values()
            .filter(|inv| inv.status == InvestmentStatus::Active)
    }

    /// Exclusivity check: the investor's non-cancelled investment, if any.
    pub fn holding_of(&self, investor: &InvestorId) -> Option<&Investment> {
        self.investments
            .values()
            .find(|inv| inv.investor_id == *investor && inv.status.counts_against_capacity())
    }

    pub fn investment(&self, id: &InvestmentId) -> Option<&Investment> {
        self.investments.get(id)
    }

    pub fn investment_mut(&mut self, id: &InvestmentId) -> Option<&mut Investment> {
        self.investments.get_mut(id)
    }

    pub fn has_active_investments(&self) -> bool {
        self.active_investments().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use finvoice_core::{Amount, BasisPoints, Currency};
    use finvoice_risk::{RiskEngine, RiskInput};

    fn book() -> InvoiceBook {
        let risk = RiskEngine::new().assess(&RiskInput {
            principal: Amount::from_major(10_000),
            currency: Currency::Usd,
            tenor_days: 30,
            quoted_yield: BasisPoints(800),
            industry: None,
            seller_history: None,
            buyer_history: None,
            market: None,
        });
        let invoice = Invoice::create(
            crate::invoice::InvoiceDraft {
                seller_id: "s".into(),
                buyer_name: "b".into(),
                principal: Amount::from_major(10_000),
                currency: Currency::Usd,
                tenor_days: 30,
                quoted_yield: BasisPoints(800),
                funding_goal: None,
                industry: None,
            },
            risk,
            Utc::now(),
        );
        InvoiceBook::new(invoice)
    }

    #[test]
    fn test_cancelled_holding_does_not_block_exclusivity() {
        let mut book = book();
        let investor = InvestorId::new();
        let mut inv = Investment::commit(
            book.invoice.id,
            investor,
            Amount::from_major(1_000),
            book.invoice.funding_goal,
            BasisPoints(800),
            30,
            Utc::now(),
        );
        inv.status = InvestmentStatus::Cancelled;
        book.investments.insert(inv.id, inv);

        assert!(book.holding_of(&investor).is_none());
        assert!(!book.has_active_investments());
    }

    #[test]
    fn test_active_holding_blocks_exclusivity() {
        let mut book = book();
        let investor = InvestorId::new();
        let inv = Investment::commit(
            book.invoice.id,
            investor,
            Amount::from_major(1_000),
            book.invoice.funding_goal,
            BasisPoints(800),
            30,
            Utc::now(),
        );
        book.investments.insert(inv.id, inv);

        assert!(book.holding_of(&investor).is_some());
        assert!(book.has_active_investments());
    }
}
