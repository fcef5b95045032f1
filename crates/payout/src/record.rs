//! Immutable settlement records
//!
//! A `PayoutRecord` is created once per invoice when the settlement
//! commits. Its claim slots are the only mutable part, and each flips a
//! single `AtomicBool` so claiming needs no lock at all.

use chrono::{DateTime, Utc};
use finvoice_core::{Amount, InvestmentId, InvestorId, InvoiceId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use strum_macros::Display;

/// What kind of money is being distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SettlementKind {
    BuyerPayment,
    DefaultRecovery,
}

/// One investor's claimable amount on a settled invoice.
#[derive(Debug)]
pub struct ClaimSlot {
    investor_id: InvestorId,
    amount: Amount,
    claimed: AtomicBool,
}

impl ClaimSlot {
    fn new(investor_id: InvestorId, amount: Amount) -> Self {
        Self {
            investor_id,
            amount,
            claimed: AtomicBool::new(false),
        }
    }

    pub fn investor_id(&self) -> InvestorId {
        self.investor_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Compare-and-swap the claim flag. Exactly one caller ever gets
    /// `true`, no matter how many race.
    pub(crate) fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// The settlement of one invoice.
#[derive(Debug)]
pub struct PayoutRecord {
    pub invoice_id: InvoiceId,
    pub kind: SettlementKind,
    /// Amount received from the buyer (or recovered on default)
    pub gross: Amount,
    pub platform_fee: Amount,
    /// `gross - platform_fee`; equals the sum of all claim slots
    pub total_payout: Amount,
    /// External payment reference, when the settlement carries one
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
    slots: HashMap<InvestmentId, ClaimSlot>,
}

impl PayoutRecord {
    pub(crate) fn new(
        invoice_id: InvoiceId,
        kind: SettlementKind,
        gross: Amount,
        platform_fee: Amount,
        total_payout: Amount,
        reference: Option<String>,
        claims: Vec<(InvestmentId, InvestorId, Amount)>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let slots = claims
            .into_iter()
            .map(|(id, investor, amount)| (id, ClaimSlot::new(investor, amount)))
            .collect();
        Self {
            invoice_id,
            kind,
            gross,
            platform_fee,
            total_payout,
            reference,
            created_at,
            slots,
        }
    }

    pub fn slot(&self, investment_id: &InvestmentId) -> Option<&ClaimSlot> {
        self.slots.get(investment_id)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&InvestmentId, &ClaimSlot)> {
        self.slots.iter()
    }

    /// Sum of all claim slots; by construction equals `total_payout`.
    pub fn allocated_total(&self) -> Amount {
        self.slots
            .values()
            .fold(Amount::ZERO, |acc, slot| {
                acc.checked_add(&slot.amount()).unwrap_or(acc)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record() -> PayoutRecord {
        let claims = vec![
            (InvestmentId::new(), InvestorId::new(), Amount::new_unchecked(dec!(3920))),
            (InvestmentId::new(), InvestorId::new(), Amount::new_unchecked(dec!(5880))),
        ];
        PayoutRecord::new(
            InvoiceId::new(),
            SettlementKind::BuyerPayment,
            Amount::new_unchecked(dec!(10000)),
            Amount::new_unchecked(dec!(200)),
            Amount::new_unchecked(dec!(9800)),
            Some("wire-0001".into()),
            claims,
            Utc::now(),
        )
    }

    #[test]
    fn test_slots_sum_to_total_payout() {
        let record = record();
        assert_eq!(record.allocated_total(), record.total_payout);
    }

    #[test]
    fn test_claim_flips_exactly_once() {
        let record = record();
        let id = *record.slots().next().unwrap().0;
        let slot = record.slot(&id).unwrap();

        assert!(!slot.is_claimed());
        assert!(slot.try_claim());
        assert!(!slot.try_claim());
        assert!(slot.is_claimed());
    }
}
