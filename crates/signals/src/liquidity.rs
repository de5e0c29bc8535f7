//! Order-book depth and fill slippage.
//!
//! Walks the ask side of a book to estimate what a market buy of a given USD
//! size would pay on average, and grades total resting depth.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tradedesk_core::{BookLevel, OrderBook};

/// Bucket of total resting depth (both sides, USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiquidityGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LiquidityGrade {
    #[must_use]
    pub fn from_depth(total_usd: Decimal) -> Self {
        if total_usd > dec!(50000) {
            Self::A
        } else if total_usd > dec!(10000) {
            Self::B
        } else if total_usd > dec!(2000) {
            Self::C
        } else if total_usd > dec!(500) {
            Self::D
        } else {
            Self::F
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::A => "A (Excellent)",
            Self::B => "B (Good)",
            Self::C => "C (Fair)",
            Self::D => "D (Thin)",
            Self::F => "F (Illiquid)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthAnalysis {
    /// Highest bid, 0 when there are no bids.
    pub best_bid: Decimal,
    /// Lowest ask, 1 when there are no asks.
    pub best_ask: Decimal,
    pub spread: Decimal,
    /// Spread as a percentage of the best ask.
    pub spread_pct: Decimal,
    pub bid_depth_usd: Decimal,
    pub ask_depth_usd: Decimal,
    pub total_depth_usd: Decimal,
    pub grade: LiquidityGrade,
    /// USD size the fill walk was asked to buy.
    pub position_usd: Decimal,
    /// Share-weighted average fill price, when anything filled.
    pub avg_fill_price: Option<Decimal>,
    /// Average fill above the best ask, in percent. Zero on a partial fill.
    pub slippage_pct: Decimal,
    /// USD the book could not absorb.
    pub unfilled_usd: Decimal,
    pub bid_levels: usize,
    pub ask_levels: usize,
}

impl DepthAnalysis {
    /// Whether the whole position fits in the book.
    #[must_use]
    pub fn fully_fillable(&self) -> bool {
        self.unfilled_usd.is_zero()
    }

    /// Warning shown when the book is too thin for the position.
    #[must_use]
    pub fn slippage_warning(&self) -> Option<String> {
        (!self.fully_fillable()).then(|| {
            format!(
                "Warning: Only ${:.0} of ${:.0} fillable",
                self.position_usd - self.unfilled_usd,
                self.position_usd
            )
        })
    }
}

/// Analyzes `book` for a buy of `position_usd`.
#[must_use]
pub fn analyze_depth(book: &OrderBook, position_usd: Decimal) -> DepthAnalysis {
    let mut bids = book.bids.clone();
    let mut asks = book.asks.clone();
    bids.sort_by(|a, b| b.price.cmp(&a.price));
    asks.sort_by(|a, b| a.price.cmp(&b.price));

    let best_bid = bids.first().map_or(Decimal::ZERO, |l| l.price);
    let best_ask = asks.first().map_or(Decimal::ONE, |l| l.price);
    let spread = best_ask - best_bid;
    let spread_pct = if best_ask > Decimal::ZERO {
        spread / best_ask * dec!(100)
    } else {
        Decimal::ZERO
    };

    let bid_depth_usd = notional(&bids);
    let ask_depth_usd = notional(&asks);
    let total_depth_usd = bid_depth_usd + ask_depth_usd;

    let fill = walk_asks(&asks, position_usd);
    let slippage_pct = match fill.avg_price {
        Some(avg) if fill.remaining.is_zero() && best_ask > Decimal::ZERO => {
            (avg - best_ask) / best_ask * dec!(100)
        }
        _ => Decimal::ZERO,
    };

    DepthAnalysis {
        best_bid,
        best_ask,
        spread,
        spread_pct,
        bid_depth_usd,
        ask_depth_usd,
        total_depth_usd,
        grade: LiquidityGrade::from_depth(total_depth_usd),
        position_usd,
        avg_fill_price: fill.avg_price,
        slippage_pct,
        unfilled_usd: fill.remaining,
        bid_levels: bids.len(),
        ask_levels: asks.len(),
    }
}

fn notional(levels: &[BookLevel]) -> Decimal {
    levels.iter().map(|l| l.price * l.size).sum()
}

struct Fill {
    avg_price: Option<Decimal>,
    remaining: Decimal,
}

/// Consumes ask levels, cheapest first, until `budget_usd` is spent.
fn walk_asks(asks: &[BookLevel], budget_usd: Decimal) -> Fill {
    let mut remaining = budget_usd.max(Decimal::ZERO);
    let mut spent = Decimal::ZERO;
    let mut shares = Decimal::ZERO;

    for level in asks.iter().filter(|l| l.price > Decimal::ZERO) {
        if remaining.is_zero() {
            break;
        }
        let take = (level.price * level.size).min(remaining);
        shares += take / level.price;
        spent += take;
        remaining -= take;
    }

    Fill {
        avg_price: (shares > Decimal::ZERO).then(|| spent / shares),
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: Decimal, size: Decimal) -> BookLevel {
        BookLevel { price, size }
    }

    fn book() -> OrderBook {
        OrderBook {
            // Deliberately out of order.
            bids: vec![level(dec!(0.40), dec!(100)), level(dec!(0.45), dec!(200))],
            asks: vec![level(dec!(0.625), dec!(160)), level(dec!(0.50), dec!(100))],
        }
    }

    #[test]
    fn top_of_book_and_depth() {
        let a = analyze_depth(&book(), dec!(10));
        assert_eq!(a.best_bid, dec!(0.45));
        assert_eq!(a.best_ask, dec!(0.50));
        assert_eq!(a.spread, dec!(0.05));
        assert_eq!(a.spread_pct, dec!(10));
        assert_eq!(a.bid_depth_usd, dec!(130));
        assert_eq!(a.ask_depth_usd, dec!(150));
        assert_eq!(a.total_depth_usd, dec!(280));
        assert_eq!(a.grade, LiquidityGrade::F);
        assert_eq!((a.bid_levels, a.ask_levels), (2, 2));
    }

    #[test]
    fn fill_within_first_level_has_no_slippage() {
        let a = analyze_depth(&book(), dec!(40));
        assert_eq!(a.avg_fill_price, Some(dec!(0.50)));
        assert!(a.slippage_pct.is_zero());
        assert!(a.fully_fillable());
        assert_eq!(a.slippage_warning(), None);
    }

    #[test]
    fn average_fill_is_share_weighted() {
        // $50 buys 100 shares at 0.50, $50 buys 80 shares at 0.625.
        let a = analyze_depth(&book(), dec!(100));
        let avg = a.avg_fill_price.unwrap();
        assert_eq!(avg.round_dp(4), dec!(0.5556));
        assert_eq!(a.slippage_pct.round_dp(2), dec!(11.11));
        assert!(a.fully_fillable());
    }

    #[test]
    fn partial_fill_reports_unfilled() {
        let a = analyze_depth(&book(), dec!(200));
        assert_eq!(a.unfilled_usd, dec!(50));
        assert!(a.slippage_pct.is_zero());
        assert_eq!(
            a.slippage_warning().as_deref(),
            Some("Warning: Only $150 of $200 fillable")
        );
    }

    #[test]
    fn empty_book_defaults() {
        let a = analyze_depth(&OrderBook::default(), dec!(100));
        assert_eq!(a.best_bid, Decimal::ZERO);
        assert_eq!(a.best_ask, Decimal::ONE);
        assert_eq!(a.spread, Decimal::ONE);
        assert_eq!(a.avg_fill_price, None);
        assert_eq!(a.unfilled_usd, dec!(100));
        assert_eq!(a.grade, LiquidityGrade::F);
    }

    #[test]
    fn grade_thresholds_are_exclusive() {
        assert_eq!(LiquidityGrade::from_depth(dec!(50001)), LiquidityGrade::A);
        assert_eq!(LiquidityGrade::from_depth(dec!(50000)), LiquidityGrade::B);
        assert_eq!(LiquidityGrade::from_depth(dec!(10000)), LiquidityGrade::C);
        assert_eq!(LiquidityGrade::from_depth(dec!(2000)), LiquidityGrade::D);
        assert_eq!(LiquidityGrade::from_depth(dec!(500)), LiquidityGrade::F);
        assert_eq!(LiquidityGrade::D.label(), "D (Thin)");
    }
}
