//! Risk engine implementation
//!
//! `assess` sums independently weighted sub-scores, maps the total into a
//! grade bucket, and interpolates a yield adjustment inside that bucket's
//! basis-point range. It is deterministic and never fails: a missing
//! aggregate contributes its documented conservative default instead of
//! an error, so risk assessment can never block invoice creation.

use crate::assessment::{RiskAssessment, RiskFactor, RiskGrade};
use crate::config::RiskConfig;
use crate::input::{BuyerHistory, MarketConditions, RiskInput, SellerHistory};
use finvoice_core::BasisPoints;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

/// Risk engine - scores and prices invoices.
///
/// Stateless apart from its policy configuration.
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    /// Create an engine with the default policy
    pub fn new() -> Self {
        Self {
            config: RiskConfig::default(),
        }
    }

    /// Create an engine with a custom policy
    pub fn with_config(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Assess one invoice.
    ///
    /// Factor order is stable: amount, tenor, currency, industry (only
    /// when an industry was collected), seller history, buyer history,
    /// market conditions.
    pub fn assess(&self, input: &RiskInput) -> RiskAssessment {
        let mut factors = Vec::with_capacity(7);

        factors.push(self.amount_factor(input));
        factors.push(self.tenor_factor(input));
        factors.push(self.currency_factor(input));
        if let Some(factor) = self.industry_factor(input) {
            factors.push(factor);
        }
        factors.push(self.seller_factor(input.seller_history.as_ref()));
        factors.push(self.buyer_factor(input.buyer_history.as_ref()));
        factors.push(self.market_factor(input.market.as_ref()));

        let score: Decimal = factors.iter().map(|f| f.score).sum();
        let band = self.config.band_for(score);
        let yield_adjustment = self.interpolate_yield(score);

        debug!(
            score = %score,
            grade = %band.grade,
            adjustment = %yield_adjustment,
            "invoice assessed"
        );

        RiskAssessment {
            score,
            grade: band.grade,
            factors,
            yield_adjustment,
        }
    }

    fn amount_factor(&self, input: &RiskInput) -> RiskFactor {
        let principal = input.principal.value();
        for (bound, score) in &self.config.amount_bands {
            if principal < *bound {
                return RiskFactor::new(
                    "amount",
                    *score,
                    format!("principal {} below {}", principal, bound),
                );
            }
        }
        RiskFactor::new(
            "amount",
            self.config.amount_top_score,
            format!("principal {} in top band", principal),
        )
    }

    fn tenor_factor(&self, input: &RiskInput) -> RiskFactor {
        for (bound, score) in &self.config.tenor_bands {
            if input.tenor_days <= *bound {
                return RiskFactor::new(
                    "tenor",
                    *score,
                    format!("{} day tenor within {} days", input.tenor_days, bound),
                );
            }
        }
        RiskFactor::new(
            "tenor",
            self.config.tenor_top_score,
            format!("{} day tenor in top band", input.tenor_days),
        )
    }

    fn currency_factor(&self, input: &RiskInput) -> RiskFactor {
        let code = input.currency.code();
        match self
            .config
            .currency_scores
            .iter()
            .find(|(c, _)| c == code)
        {
            Some((_, score)) => {
                RiskFactor::new("currency", *score, format!("listed currency {}", code))
            }
            None => RiskFactor::new(
                "currency",
                self.config.unknown_currency_score,
                format!("unlisted currency {}, conservative default", code),
            ),
        }
    }

    fn industry_factor(&self, input: &RiskInput) -> Option<RiskFactor> {
        let industry = input.industry.as_deref()?;
        let normalized = industry.to_lowercase();
        let factor = match self
            .config
            .industry_scores
            .iter()
            .find(|(name, _)| *name == normalized)
        {
            Some((_, score)) => {
                RiskFactor::new("industry", *score, format!("listed industry {}", normalized))
            }
            None => RiskFactor::new(
                "industry",
                self.config.unknown_industry_score,
                format!("unlisted industry {}, conservative default", normalized),
            ),
        };
        Some(factor)
    }

    fn seller_factor(&self, history: Option<&SellerHistory>) -> RiskFactor {
        let Some(history) = history else {
            return RiskFactor::new(
                "seller_history",
                self.config.new_seller_score,
                "no prior invoices for seller",
            );
        };
        if history.invoices_issued == 0 {
            return RiskFactor::new(
                "seller_history",
                self.config.new_seller_score,
                "no prior invoices for seller",
            );
        }

        let default_score = step_score(&self.config.seller_default_rate_steps, history.default_rate);
        let delay_score = step_score(
            &self.config.seller_delay_steps,
            history.avg_settlement_delay_days,
        );

        RiskFactor::new(
            "seller_history",
            default_score + delay_score,
            format!(
                "{} prior invoices, default rate {}, avg settlement delay {} days",
                history.invoices_issued, history.default_rate, history.avg_settlement_delay_days
            ),
        )
    }

    fn buyer_factor(&self, history: Option<&BuyerHistory>) -> RiskFactor {
        let Some(history) = history else {
            return RiskFactor::new(
                "buyer_history",
                self.config.new_buyer_score,
                "buyer not previously seen",
            );
        };
        if history.invoices_observed == 0 {
            return RiskFactor::new(
                "buyer_history",
                self.config.new_buyer_score,
                "buyer not previously seen",
            );
        }

        let payment_score = self
            .config
            .buyer_payment_rate_steps
            .iter()
            .find(|(bound, _)| history.payment_rate >= *bound)
            .map(|(_, score)| *score)
            .unwrap_or(self.config.buyer_payment_rate_floor_score);
        let default_score = step_score(&self.config.buyer_default_rate_steps, history.default_rate);

        RiskFactor::new(
            "buyer_history",
            payment_score + default_score,
            format!(
                "{} invoices observed, payment rate {}, default rate {}",
                history.invoices_observed, history.payment_rate, history.default_rate
            ),
        )
    }

    fn market_factor(&self, market: Option<&MarketConditions>) -> RiskFactor {
        let Some(market) = market else {
            return RiskFactor::new("market", Decimal::ZERO, "no market data, neutral");
        };

        let mut score = Decimal::ZERO;
        let mut notes = Vec::new();

        if market.month == 12 {
            score += self.config.year_end_score;
            notes.push("year-end liquidity premium".to_string());
        } else if self.config.quarter_end_months.contains(&market.month) {
            score += self.config.quarter_end_score;
            notes.push("quarter-end liquidity premium".to_string());
        }

        if let Some(stress) = market.stress_index {
            let stress = stress.clamp(Decimal::ZERO, Decimal::ONE);
            score += stress * self.config.stress_weight;
            notes.push(format!("stress index {}", stress));
        }

        let score = score.min(self.config.market_score_cap);
        let rationale = if notes.is_empty() {
            "seasonally neutral".to_string()
        } else {
            notes.join("; ")
        };
        RiskFactor::new("market", score, rationale)
    }

    /// Linearly interpolate the yield adjustment inside the matched
    /// grade's bps range by where the score sits in the grade's score
    /// range. The unbounded HIGH band interpolates up to the configured
    /// cap score and saturates above it, keeping the recommendation
    /// continuous and monotonic.
    fn interpolate_yield(&self, score: Decimal) -> BasisPoints {
        let band = self.config.band_for(score);
        let top = band.score_max.unwrap_or(self.config.high_grade_cap_score);
        let span = top - band.score_min;
        if span <= Decimal::ZERO {
            return BasisPoints(band.bps_min);
        }

        let position = ((score - band.score_min) / span).clamp(Decimal::ZERO, Decimal::ONE);
        let bps_span = Decimal::from(band.bps_max - band.bps_min);
        let adjustment = Decimal::from(band.bps_min) + bps_span * position;
        BasisPoints(adjustment.round().to_i64().unwrap_or(band.bps_max))
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Step tables are (exclusive lower bound, score) pairs ordered highest
/// bound first; the first bound the value exceeds wins, otherwise zero.
fn step_score(steps: &[(Decimal, Decimal)], value: Decimal) -> Decimal {
    steps
        .iter()
        .find(|(bound, _)| value > *bound)
        .map(|(_, score)| *score)
        .unwrap_or(Decimal::ZERO)
}
