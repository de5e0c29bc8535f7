//! Opportunity detection over normalized binary markets.
//!
//! Two signal classes are checked per market:
//!
//! - **Arbitrage**: YES + NO below the threshold; strength is `1 - sum`.
//! - **Wide spread**: YES ask minus YES bid at or above the minimum; strength
//!   is the spread itself.
//!
//! Signals from every venue are pooled, sorted by strength (descending), and
//! truncated to the configured top N. Ties fall back to venue name, then
//! market id, so identical inputs always rank identically.

use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use tradedesk_core::{NormalizedMarket, Opportunity, OpportunityKind, ScanConfig, Venue};

/// Result of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanOutcome {
    /// Strongest signals, at most `top_n`.
    pub ranked: Vec<Opportunity>,
    /// Signals detected before truncation.
    pub total_found: usize,
    /// Signals detected per venue, in report order. Venues with none are
    /// omitted.
    pub per_venue: Vec<(Venue, usize)>,
}

#[derive(Debug, Clone)]
pub struct OpportunityScanner {
    config: ScanConfig,
}

impl Default for OpportunityScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl OpportunityScanner {
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Arbitrage signal for one market, if YES + NO is under the threshold.
    #[must_use]
    pub fn arbitrage(&self, market: &NormalizedMarket) -> Option<Opportunity> {
        let sum = market.price_sum();
        if sum >= self.config.arbitrage_sum_threshold {
            return None;
        }
        Some(opportunity(
            market,
            OpportunityKind::Arbitrage,
            Decimal::ONE - sum,
            format!(
                "Yes ${:.2} + No ${:.2} = ${:.2}",
                market.yes_price, market.no_price, sum
            ),
        ))
    }

    /// Wide-spread signal for one market, if a bid exists and the spread is
    /// at least the minimum.
    #[must_use]
    pub fn wide_spread(&self, market: &NormalizedMarket) -> Option<Opportunity> {
        let spread = market.yes_spread()?;
        if spread < self.config.min_spread {
            return None;
        }
        let bid = market.yes_bid.unwrap_or_default();
        Some(opportunity(
            market,
            OpportunityKind::WideSpread,
            spread,
            format!(
                "Bid ${:.2} / Ask ${:.2} (spread ${:.2})",
                bid, market.yes_price, spread
            ),
        ))
    }

    /// Every signal one market produces.
    #[must_use]
    pub fn evaluate(&self, market: &NormalizedMarket) -> Vec<Opportunity> {
        [self.arbitrage(market), self.wide_spread(market)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Scans `markets` from any number of venues and ranks the results.
    #[must_use]
    pub fn scan(&self, markets: &[NormalizedMarket]) -> ScanOutcome {
        let mut found: Vec<Opportunity> = markets.iter().flat_map(|m| self.evaluate(m)).collect();
        found.sort_by(rank);

        let per_venue = Venue::all()
            .iter()
            .map(|venue| (*venue, found.iter().filter(|o| o.venue == *venue).count()))
            .filter(|(_, count)| *count > 0)
            .collect();
        let total_found = found.len();
        found.truncate(self.config.top_n);

        tracing::debug!(
            markets = markets.len(),
            total_found,
            kept = found.len(),
            "opportunity scan complete"
        );

        ScanOutcome {
            ranked: found,
            total_found,
            per_venue,
        }
    }
}

fn opportunity(
    market: &NormalizedMarket,
    kind: OpportunityKind,
    expected_value: Decimal,
    detail: String,
) -> Opportunity {
    Opportunity {
        venue: market.venue,
        market_id: market.market_id.clone(),
        question: market.question.clone(),
        kind,
        expected_value: expected_value.max(Decimal::ZERO),
        detail,
    }
}

fn rank(a: &Opportunity, b: &Opportunity) -> Ordering {
    b.expected_value
        .cmp(&a.expected_value)
        .then_with(|| a.venue.name().cmp(b.venue.name()))
        .then_with(|| a.market_id.cmp(&b.market_id))
}
