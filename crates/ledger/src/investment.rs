//! Investment records

use chrono::{DateTime, Utc};
use finvoice_core::{Amount, BasisPoints, InvestmentId, InvestorId, InvoiceId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Status of a single investment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvestmentStatus {
    /// Committed; counts against capacity
    Active,
    /// Withdrawn within the window; terminal, never resurrected
    Cancelled,
    /// Invoice paid and payout distributed
    Completed,
    /// Invoice defaulted; recovery distributed
    Defaulted,
}

impl InvestmentStatus {
    /// Cancelled investments stop counting for exclusivity and capacity.
    pub fn counts_against_capacity(&self) -> bool {
        !matches!(self, InvestmentStatus::Cancelled)
    }
}

/// One investor's stake in one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub invoice_id: InvoiceId,
    pub investor_id: InvestorId,
    pub amount: Amount,
    /// `amount / funding_goal`, computed at commit time and frozen so a
    /// later cancellation of someone else's investment cannot
    /// retroactively change this investor's contractual share
    pub share_percentage: Decimal,
    pub status: InvestmentStatus,
    /// Principal plus simple interest over the invoice tenor
    pub expected_return: Amount,
    /// Set once the payout is claimed
    pub actual_return: Option<Amount>,
    /// Write-once; flipped by the payout distributor exactly once
    pub payout_claimed: bool,
    pub created_at: DateTime<Utc>,
}

impl Investment {
    /// Commit a new active investment against an invoice.
    pub fn commit(
        invoice_id: InvoiceId,
        investor_id: InvestorId,
        amount: Amount,
        funding_goal: Amount,
        quoted_yield: BasisPoints,
        tenor_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let share_percentage = amount.value() / funding_goal.value();
        Self {
            id: InvestmentId::new(),
            invoice_id,
            investor_id,
            amount,
            share_percentage,
            status: InvestmentStatus::Active,
            expected_return: expected_return(amount, quoted_yield, tenor_days),
            actual_return: None,
            payout_claimed: false,
            created_at: now,
        }
    }
}

/// Simple interest over the tenor on a 365-day year:
/// `amount × (1 + rate × tenor/365)`.
pub fn expected_return(amount: Amount, quoted_yield: BasisPoints, tenor_days: u32) -> Amount {
    let rate = quoted_yield.as_rate();
    let year_fraction = Decimal::from(tenor_days) / Decimal::from(365u32);
    let interest = amount.value() * rate * year_fraction;
    Amount::new_unchecked(amount.value() + interest)
}
