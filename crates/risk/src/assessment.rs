//! Risk assessment output types

use finvoice_core::BasisPoints;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk grade bucket.
///
/// Buckets are fixed half-open score ranges: LOW [0, 30), MEDIUM [30, 60),
/// HIGH [60, ∞). There is no upper clamp; any score at or above the top of
/// MEDIUM lands in HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskGrade {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskGrade::Low => write!(f, "LOW"),
            RiskGrade::Medium => write!(f, "MEDIUM"),
            RiskGrade::High => write!(f, "HIGH"),
        }
    }
}

/// One weighted contribution to the total score, with its rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Stable factor name, e.g. "amount", "seller_history"
    pub name: String,
    /// Sub-score contributed by this factor (already weighted)
    pub score: Decimal,
    /// Human-readable explanation of the contribution
    pub rationale: String,
}

impl RiskFactor {
    pub fn new(name: impl Into<String>, score: Decimal, rationale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score,
            rationale: rationale.into(),
        }
    }
}

/// Result of assessing a single invoice.
///
/// Produced fresh on every call and never mutated. Two calls with
/// identical inputs produce identical assessments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Total score: sum of the factor sub-scores. Non-negative, unbounded.
    pub score: Decimal,
    /// Grade bucket the score falls into
    pub grade: RiskGrade,
    /// Ordered factor breakdown explaining the score
    pub factors: Vec<RiskFactor>,
    /// Suggested addition to the quoted yield
    pub yield_adjustment: BasisPoints,
}
