//! Risk engine inputs
//!
//! Seller/buyer/market aggregates are fetched by the caller and passed in
//! so that `assess` stays a pure, testable function.

use finvoice_core::{Amount, BasisPoints, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Historical performance of the invoice's seller on this platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerHistory {
    /// Invoices the seller has previously issued
    pub invoices_issued: u64,
    /// Fraction of those invoices that defaulted, in [0, 1]
    pub default_rate: Decimal,
    /// Average days past maturity before settlement
    pub avg_settlement_delay_days: Decimal,
}

/// Historical payment behaviour of the buyer, name-matched across the
/// platform's invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerHistory {
    /// Invoices observed for this buyer
    pub invoices_observed: u64,
    /// Fraction paid in full, in [0, 1]
    pub payment_rate: Decimal,
    /// Fraction defaulted, in [0, 1]
    pub default_rate: Decimal,
}

/// Small, bounded market adjustment inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    /// Calendar month of assessment (1-12); quarter ends carry a
    /// liquidity premium
    pub month: u32,
    /// Optional macro stress indicator in [0, 1]
    pub stress_index: Option<Decimal>,
}

/// Everything the risk engine looks at for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskInput {
    pub principal: Amount,
    pub currency: Currency,
    pub tenor_days: u32,
    pub quoted_yield: BasisPoints,
    /// Seller's industry code, if collected
    pub industry: Option<String>,
    /// None when the aggregate could not be fetched
    pub seller_history: Option<SellerHistory>,
    /// None for buyers never seen before
    pub buyer_history: Option<BuyerHistory>,
    pub market: Option<MarketConditions>,
}
