//! Kelly criterion for binary contracts.
//!
//! Buying YES at price `c` pays `1/c - 1` per unit staked on a win, so the
//! net odds are `b = 1/c - 1` and the growth-optimal fraction is
//! `(b·p - (1 - p)) / b`.

use serde::Serialize;

/// Full, half, and quarter Kelly fractions of bankroll.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct KellyFractions {
    pub full: f64,
    pub half: f64,
    pub quarter: f64,
}

impl KellyFractions {
    pub const ZERO: Self = Self {
        full: 0.0,
        half: 0.0,
        quarter: 0.0,
    };

    #[must_use]
    pub fn has_edge(&self) -> bool {
        self.full > 0.0
    }
}

/// Kelly fractions for buying YES at `market_price` when the true
/// probability is `fair_prob`.
///
/// Zero when there is no positive edge or the price is outside `(0, 1)`.
#[must_use]
pub fn kelly(fair_prob: f64, market_price: f64) -> KellyFractions {
    if !(market_price > 0.0 && market_price < 1.0) || fair_prob <= market_price {
        return KellyFractions::ZERO;
    }
    let b = 1.0 / market_price - 1.0;
    let full = ((b * fair_prob - (1.0 - fair_prob)) / b).clamp(0.0, 1.0);
    KellyFractions {
        full,
        half: full * 0.5,
        quarter: full * 0.25,
    }
}

/// Stake in USD for a Kelly fraction, capped at `max_pct` of bankroll.
#[must_use]
pub fn position_size(fraction: f64, bankroll: f64, max_pct: f64) -> f64 {
    (bankroll * fraction).min(bankroll * max_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_percent_fair_at_five_cents() {
        let k = kelly(0.20, 0.05);
        // b = 19: (19 * 0.2 - 0.8) / 19
        assert!((k.full - 3.0 / 19.0).abs() < 1e-12);
        assert!((k.full - 0.158).abs() < 0.001);
        assert!((k.half - k.full / 2.0).abs() < 1e-15);
        assert!((k.quarter - k.full / 4.0).abs() < 1e-15);
    }

    #[test]
    fn no_edge_is_zero() {
        for (fair, price) in [(0.05, 0.05), (0.04, 0.05), (0.0, 0.5), (0.5, 0.9)] {
            assert_eq!(kelly(fair, price), KellyFractions::ZERO, "{fair} vs {price}");
        }
    }

    #[test]
    fn price_outside_unit_interval_is_zero() {
        assert_eq!(kelly(0.5, 0.0), KellyFractions::ZERO);
        assert_eq!(kelly(1.0, 1.0), KellyFractions::ZERO);
        assert_eq!(kelly(0.5, -0.1), KellyFractions::ZERO);
        assert_eq!(kelly(0.5, f64::NAN), KellyFractions::ZERO);
    }

    #[test]
    fn certain_win_is_full_bankroll() {
        let k = kelly(1.0, 0.5);
        assert_eq!(k.full, 1.0);
    }

    #[test]
    fn position_capped_by_max_pct() {
        assert_eq!(position_size(0.05, 1000.0, 0.10), 50.0);
        assert_eq!(position_size(0.30, 1000.0, 0.10), 100.0);
        assert_eq!(position_size(0.0, 1000.0, 0.10), 0.0);
    }
}
