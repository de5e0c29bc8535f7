//! Position sizing and risk analysis for binary contracts.
//!
//! [`kelly`] sizes a YES purchase from a fair probability and a price,
//! [`ruin`] estimates the chance of losing the bankroll, and [`analysis`]
//! combines both with portfolio limits into a recommendation.

pub mod analysis;
pub mod kelly;
pub mod ruin;

pub use analysis::{grade, max_concurrent_positions, Recommendation, RiskAnalysis, RiskError};
pub use kelly::{kelly, position_size, KellyFractions};
pub use ruin::{risk_of_ruin, MAX_RUIN_PCT};
