//! Finvoice risk engine
//!
//! Pure scoring function that gates and prices each invoice before it is
//! listed for investment. Given pre-fetched invoice, seller, buyer and
//! market aggregates it produces a [`RiskAssessment`]: a total score, a
//! grade bucket, the weighted factors that explain the score, and a
//! suggested yield adjustment in basis points.
//!
//! Assessment never fails and never blocks invoice creation: missing
//! aggregates degrade to conservative documented defaults.

pub mod assessment;
pub mod config;
pub mod engine;
pub mod input;

pub use assessment::{RiskAssessment, RiskFactor, RiskGrade};
pub use config::{GradeBand, RiskConfig};
pub use engine::RiskEngine;
pub use input::{BuyerHistory, MarketConditions, RiskInput, SellerHistory};
