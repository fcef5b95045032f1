//! Risk policy configuration
//!
//! Every threshold, band and table the engine consults lives here rather
//! than in code, so deployments can tune pricing policy without a
//! recompile. `Default` carries the platform's launch policy.

use crate::assessment::RiskGrade;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One grade bucket: its half-open score range and the basis-point range
/// the yield adjustment interpolates over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub grade: RiskGrade,
    /// Inclusive lower score bound
    pub score_min: Decimal,
    /// Exclusive upper score bound; None for the unbounded top grade
    pub score_max: Option<Decimal>,
    /// Yield adjustment at the bottom of the band
    pub bps_min: i64,
    /// Yield adjustment at the top of the band
    pub bps_max: i64,
}

impl GradeBand {
    pub fn contains(&self, score: Decimal) -> bool {
        score >= self.score_min && self.score_max.map_or(true, |max| score < max)
    }
}

/// Full risk policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Amount bands: (exclusive upper bound, score). Checked in order;
    /// amounts at or above the last bound get `amount_top_score`.
    pub amount_bands: Vec<(Decimal, Decimal)>,
    pub amount_top_score: Decimal,

    /// Tenor bands: (inclusive upper bound in days, score)
    pub tenor_bands: Vec<(u32, Decimal)>,
    pub tenor_top_score: Decimal,

    /// Fixed per-currency scores; unlisted codes get the conservative default
    pub currency_scores: Vec<(String, Decimal)>,
    pub unknown_currency_score: Decimal,

    /// Optional per-industry scores; unlisted industries get the default
    pub industry_scores: Vec<(String, Decimal)>,
    pub unknown_industry_score: Decimal,

    /// Sub-score for sellers with no prior invoices (not zero-risk)
    pub new_seller_score: Decimal,
    /// (exclusive lower default-rate bound, score) checked highest first
    pub seller_default_rate_steps: Vec<(Decimal, Decimal)>,
    /// (exclusive lower settlement-delay bound in days, score) highest first
    pub seller_delay_steps: Vec<(Decimal, Decimal)>,

    /// Sub-score for buyers never seen before
    pub new_buyer_score: Decimal,
    /// (inclusive lower payment-rate bound, score) checked highest first
    pub buyer_payment_rate_steps: Vec<(Decimal, Decimal)>,
    /// Fallback when payment rate is below every step
    pub buyer_payment_rate_floor_score: Decimal,
    /// (exclusive lower default-rate bound, score) highest first
    pub buyer_default_rate_steps: Vec<(Decimal, Decimal)>,

    /// Months carrying a quarter-end liquidity premium
    pub quarter_end_months: Vec<u32>,
    pub quarter_end_score: Decimal,
    pub year_end_score: Decimal,
    /// Multiplier applied to the macro stress index
    pub stress_weight: Decimal,
    /// Upper bound on the whole market factor
    pub market_score_cap: Decimal,

    /// Grade buckets, ascending by score range
    pub grade_bands: Vec<GradeBand>,
    /// Score at which HIGH-grade interpolation saturates
    pub high_grade_cap_score: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            amount_bands: vec![
                (dec!(10_000), dec!(2)),
                (dec!(50_000), dec!(5)),
                (dec!(250_000), dec!(8)),
            ],
            amount_top_score: dec!(12),

            tenor_bands: vec![(30, dec!(2)), (60, dec!(4)), (90, dec!(7))],
            tenor_top_score: dec!(10),

            currency_scores: vec![
                ("USD".into(), dec!(1)),
                ("EUR".into(), dec!(1)),
                ("GBP".into(), dec!(2)),
                ("JPY".into(), dec!(2)),
                ("CHF".into(), dec!(2)),
                ("SGD".into(), dec!(3)),
                ("AED".into(), dec!(4)),
                ("CNY".into(), dec!(5)),
                ("INR".into(), dec!(5)),
                ("NGN".into(), dec!(7)),
            ],
            unknown_currency_score: dec!(8),

            industry_scores: vec![
                ("agriculture".into(), dec!(4)),
                ("commodities".into(), dec!(5)),
                ("construction".into(), dec!(6)),
                ("electronics".into(), dec!(2)),
                ("logistics".into(), dec!(3)),
                ("manufacturing".into(), dec!(2)),
                ("pharmaceuticals".into(), dec!(1)),
                ("textiles".into(), dec!(4)),
            ],
            unknown_industry_score: dec!(5),

            new_seller_score: dec!(10),
            seller_default_rate_steps: vec![
                (dec!(0.10), dec!(12)),
                (dec!(0.05), dec!(8)),
                (dec!(0.02), dec!(4)),
            ],
            seller_delay_steps: vec![
                (dec!(30), dec!(6)),
                (dec!(14), dec!(4)),
                (dec!(7), dec!(2)),
            ],

            new_buyer_score: dec!(8),
            buyer_payment_rate_steps: vec![
                (dec!(0.95), dec!(0)),
                (dec!(0.85), dec!(3)),
                (dec!(0.70), dec!(6)),
            ],
            buyer_payment_rate_floor_score: dec!(10),
            buyer_default_rate_steps: vec![(dec!(0.05), dec!(5)), (dec!(0.02), dec!(2))],

            quarter_end_months: vec![3, 6, 9],
            quarter_end_score: dec!(2),
            year_end_score: dec!(3),
            stress_weight: dec!(5),
            market_score_cap: dec!(8),

            grade_bands: vec![
                GradeBand {
                    grade: RiskGrade::Low,
                    score_min: dec!(0),
                    score_max: Some(dec!(30)),
                    bps_min: 0,
                    bps_max: 100,
                },
                GradeBand {
                    grade: RiskGrade::Medium,
                    score_min: dec!(30),
                    score_max: Some(dec!(60)),
                    bps_min: 100,
                    bps_max: 300,
                },
                GradeBand {
                    grade: RiskGrade::High,
                    score_min: dec!(60),
                    score_max: None,
                    bps_min: 300,
                    bps_max: 600,
                },
            ],
            high_grade_cap_score: dec!(100),
        }
    }
}

impl RiskConfig {
    /// Find the grade band a score falls into.
    ///
    /// The default bands cover [0, ∞) with no gaps; a misconfigured table
    /// falls back to the last (highest) band rather than failing, since
    /// assessment must never fail.
    pub fn band_for(&self, score: Decimal) -> &GradeBand {
        self.grade_bands
            .iter()
            .find(|band| band.contains(score))
            .unwrap_or_else(|| {
                self.grade_bands
                    .last()
                    .expect("grade_bands must not be empty")
            })
    }
}
