//! Signal computation over normalized venue data.
//!
//! - [`scanner`]: complementary-price arbitrage and wide-spread detection,
//!   pooled and ranked across venues
//! - [`liquidity`]: order-book depth, grade, and fill slippage for a buy of a
//!   given USD size
//! - [`technicals`]: RSI, MACD, Bollinger bands, and moving averages over the
//!   daily closes of a crypto underlying

pub mod liquidity;
pub mod scanner;
pub mod technicals;

pub use liquidity::{analyze_depth, DepthAnalysis, LiquidityGrade};
pub use scanner::{OpportunityScanner, ScanOutcome};
pub use technicals::{analyze_prices, TechnicalSignal, TechnicalSnapshot, TechnicalsConfig};
