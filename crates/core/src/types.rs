//! Normalized value types exchanged between desk components.
//!
//! Every venue speaks its own wire format; adapters convert those payloads into
//! the types below so that scanners and reports never see venue-specific
//! encodings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VenueError;

// =============================================================================
// Venue
// =============================================================================

/// External platform the desk observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// Regulated event-contract exchange.
    Kalshi,
    /// Blockchain-settled prediction market.
    Polymarket,
    /// Crypto brokerage.
    Robinhood,
    /// Spot exchange.
    Coinbase,
    /// Derivatives exchange.
    Phemex,
}

impl Venue {
    /// Display name used in reports and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kalshi => "Kalshi",
            Self::Polymarket => "Polymarket",
            Self::Robinhood => "Robinhood",
            Self::Coinbase => "Coinbase",
            Self::Phemex => "Phemex",
        }
    }

    /// All venues in report order.
    #[must_use]
    pub fn all() -> &'static [Venue] {
        &[
            Self::Kalshi,
            Self::Polymarket,
            Self::Robinhood,
            Self::Coinbase,
            Self::Phemex,
        ]
    }

    /// Returns true for venues that list binary prediction markets.
    #[must_use]
    pub fn lists_prediction_markets(&self) -> bool {
        matches!(self, Self::Kalshi | Self::Polymarket)
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Balance
// =============================================================================

/// Account balance observed on one venue.
///
/// A balance is never partially populated: the amount only exists inside
/// [`BalanceStatus::Ok`].
#[derive(Debug, Clone)]
pub struct Balance {
    /// Venue the balance belongs to.
    pub venue: Venue,
    /// When the observation was made.
    pub as_of: DateTime<Utc>,
    /// Outcome of the observation.
    pub status: BalanceStatus,
}

/// Outcome of a balance lookup.
#[derive(Debug, Clone)]
pub enum BalanceStatus {
    /// A finite amount in venue currency.
    Ok {
        /// Amount in `currency` units.
        amount: Decimal,
        /// Currency code (USD, USDC, USDT).
        currency: String,
        /// Optional qualifier shown next to the amount (e.g. "buying power").
        note: Option<String>,
    },
    /// Credentials are absent; no request was attempted.
    Unconfigured,
    /// The lookup failed.
    Error(VenueError),
}

impl Balance {
    /// Creates a successful balance stamped now.
    #[must_use]
    pub fn ok(venue: Venue, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            venue,
            as_of: Utc::now(),
            status: BalanceStatus::Ok {
                amount,
                currency: currency.into(),
                note: None,
            },
        }
    }

    /// Creates an unconfigured balance.
    #[must_use]
    pub fn unconfigured(venue: Venue) -> Self {
        Self {
            venue,
            as_of: Utc::now(),
            status: BalanceStatus::Unconfigured,
        }
    }

    /// Creates a failed balance.
    #[must_use]
    pub fn error(venue: Venue, error: VenueError) -> Self {
        Self {
            venue,
            as_of: Utc::now(),
            status: BalanceStatus::Error(error),
        }
    }

    /// Attaches a note to a successful balance. No-op for other states.
    #[must_use]
    pub fn with_note(mut self, text: impl Into<String>) -> Self {
        if let BalanceStatus::Ok { note, .. } = &mut self.status {
            *note = Some(text.into());
        }
        self
    }

    /// Returns the amount if the lookup succeeded.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        match &self.status {
            BalanceStatus::Ok { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    /// Returns true if the lookup succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.status, BalanceStatus::Ok { .. })
    }
}

/// A single non-cash asset position held on a venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Venue holding the asset.
    pub venue: Venue,
    /// Asset code (BTC, ETH, USD...).
    pub asset: String,
    /// Quantity in asset units.
    pub quantity: Decimal,
    /// USD value, when the venue reports one.
    pub usd_value: Option<Decimal>,
}

// =============================================================================
// Markets and opportunities
// =============================================================================

/// A binary market with prices expressed in the `[0, 1]` probability domain.
///
/// `yes_price` and `no_price` are observed independently; neither is derived
/// from the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMarket {
    /// Venue listing the market.
    pub venue: Venue,
    /// Venue-specific identifier (ticker, condition id).
    pub market_id: String,
    /// Market question or title.
    pub question: String,
    /// Cost of one YES share.
    pub yes_price: Decimal,
    /// Cost of one NO share.
    pub no_price: Decimal,
    /// Best YES bid, when the venue exposes one.
    pub yes_bid: Option<Decimal>,
    /// Traded volume in USD.
    pub volume: Option<Decimal>,
    /// Resting liquidity in USD.
    pub liquidity: Option<Decimal>,
}

impl NormalizedMarket {
    /// Sum of YES and NO prices.
    #[must_use]
    pub fn price_sum(&self) -> Decimal {
        self.yes_price + self.no_price
    }

    /// YES ask minus YES bid, if a bid exists.
    #[must_use]
    pub fn yes_spread(&self) -> Option<Decimal> {
        self.yes_bid
            .filter(|bid| *bid > Decimal::ZERO)
            .map(|bid| self.yes_price - bid)
    }
}

/// Class of detected opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityKind {
    /// YES + NO costs less than the guaranteed payout.
    Arbitrage,
    /// YES bid/ask spread wide enough to quote inside.
    WideSpread,
}

impl OpportunityKind {
    /// Label used in reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Arbitrage => "Arb (Yes+No < $1)",
            Self::WideSpread => "Wide Spread",
        }
    }
}

/// A ranked signal produced by one scan cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Venue listing the market.
    pub venue: Venue,
    /// Venue market identifier.
    pub market_id: String,
    /// Market question.
    pub question: String,
    /// Signal class.
    pub kind: OpportunityKind,
    /// Signal strength, never negative.
    pub expected_value: Decimal,
    /// Human-readable price breakdown.
    pub detail: String,
}

/// One price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price per share in `[0, 1]`.
    pub price: Decimal,
    /// Shares resting at this price.
    pub size: Decimal,
}

/// Resting orders for one outcome token, in venue order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

// =============================================================================
// Fair value and sizing
// =============================================================================

/// Which estimator produced a fair-value estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateSource {
    /// Stochastic variable-sampling simulation.
    Simulation,
    /// Multi-estimator consensus.
    Consensus,
    /// Base rate of historical precedents.
    Historical,
}

/// Independent probability estimate for a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueEstimate {
    /// Median probability.
    pub median_probability: f64,
    /// Lower and upper bound of the confidence band.
    pub confidence_interval: (f64, f64),
    /// Producer of the estimate.
    pub source: EstimateSource,
    /// Trials (simulation), responding estimators (consensus), or precedent
    /// events (historical).
    pub sample_size: usize,
}

/// Bucketed aggressiveness of a recommended position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskGrade {
    /// Half-Kelly below 2% of bankroll.
    Low,
    /// Half-Kelly below 5%.
    Moderate,
    /// Half-Kelly below 10%.
    Aggressive,
    /// Half-Kelly at or above 10%.
    High,
}

impl RiskGrade {
    /// Label used in reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW RISK",
            Self::Moderate => "MODERATE",
            Self::Aggressive => "AGGRESSIVE",
            Self::High => "HIGH RISK",
        }
    }
}

/// Kelly-based position sizing for one fair-value / price pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Full Kelly fraction in `[0, 1]`.
    pub full_kelly: f64,
    /// Half of `full_kelly`.
    pub half_kelly: f64,
    /// Quarter of `full_kelly`.
    pub quarter_kelly: f64,
    /// Recommended stake in USD (half Kelly, capped).
    pub recommended_usd: f64,
    /// Estimated risk of ruin in percent, capped at 99.9.
    pub risk_of_ruin_pct: f64,
    /// Aggressiveness bucket.
    pub grade: RiskGrade,
}
