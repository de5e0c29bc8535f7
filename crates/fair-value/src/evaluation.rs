//! Edge assessment of a simulated fair value against a market price.

use serde::Serialize;

use crate::simulation::SimulationSummary;

/// Full Kelly is capped here when sizing from a simulation.
const KELLY_CAP: f64 = 0.25;

/// How tight the simulated 95% band is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    #[must_use]
    pub fn from_ci_width(width: f64) -> Self {
        if width < 0.10 {
            Self::High
        } else if width < 0.25 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    StrongBuy,
    Buy,
    Fade,
    Hold,
}

impl Signal {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Fade => "SELL / FADE",
            Self::Hold => "HOLD / NO EDGE",
        }
    }

    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self {
            Self::StrongBuy => "🟢🟢",
            Self::Buy => "🟢",
            Self::Fade => "🔴",
            Self::Hold => "⚪",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAssessment {
    /// Simulated median probability.
    pub fair_value: f64,
    pub market_price: f64,
    /// Fair value minus market price.
    pub ev_absolute: f64,
    /// `ev_absolute` relative to the market price, in percent.
    pub ev_percent: f64,
    /// Full Kelly, capped at 0.25.
    pub kelly_fraction: f64,
    pub confidence: Confidence,
    pub signal: Signal,
}

/// Compares a simulated fair value with the market price.
#[must_use]
pub fn evaluate(summary: &SimulationSummary, market_price: f64) -> EdgeAssessment {
    let fair_value = summary.median;
    let ev_absolute = fair_value - market_price;
    let ev_percent = if market_price > 0.0 {
        ev_absolute / market_price * 100.0
    } else {
        0.0
    };

    let kelly_fraction = if ev_absolute > 0.0
        && fair_value > 0.0
        && fair_value < 1.0
        && market_price > 0.0
        && market_price < 1.0
    {
        let b = 1.0 / market_price - 1.0;
        ((b * fair_value - (1.0 - fair_value)) / b).clamp(0.0, KELLY_CAP)
    } else {
        0.0
    };

    let confidence = Confidence::from_ci_width(summary.ci_width());
    let signal = if ev_percent > 10.0 && confidence != Confidence::Low {
        Signal::StrongBuy
    } else if ev_percent > 5.0 {
        Signal::Buy
    } else if ev_percent < -10.0 {
        Signal::Fade
    } else {
        Signal::Hold
    };

    EdgeAssessment {
        fair_value,
        market_price,
        ev_absolute,
        ev_percent,
        kelly_fraction,
        confidence,
        signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(median: f64, ci_low: f64, ci_high: f64) -> SimulationSummary {
        SimulationSummary {
            trials: 10_000,
            median,
            mean: median,
            std_dev: 0.01,
            ci_low,
            ci_high,
            p10: ci_low,
            p90: ci_high,
        }
    }

    #[test]
    fn strong_buy_needs_tight_band() {
        let tight = evaluate(&summary(0.20, 0.17, 0.23), 0.05);
        assert!((tight.ev_absolute - 0.15).abs() < 1e-12);
        assert!((tight.ev_percent - 300.0).abs() < 1e-9);
        assert_eq!(tight.confidence, Confidence::High);
        assert_eq!(tight.signal, Signal::StrongBuy);

        let wide = evaluate(&summary(0.20, 0.02, 0.60), 0.05);
        assert_eq!(wide.confidence, Confidence::Low);
        assert_eq!(wide.signal, Signal::Buy);
    }

    #[test]
    fn kelly_capped_at_quarter() {
        // Full Kelly is (19 * 0.2 - 0.8) / 19 = 0.158, under the cap.
        let a = evaluate(&summary(0.20, 0.17, 0.23), 0.05);
        assert!((a.kelly_fraction - 3.0 / 19.0).abs() < 1e-12);

        let big = evaluate(&summary(0.90, 0.85, 0.95), 0.10);
        assert_eq!(big.kelly_fraction, KELLY_CAP);
    }

    #[test]
    fn negative_edge() {
        let a = evaluate(&summary(0.30, 0.25, 0.35), 0.50);
        assert_eq!(a.kelly_fraction, 0.0);
        assert_eq!(a.signal, Signal::Fade);

        let flat = evaluate(&summary(0.50, 0.45, 0.55), 0.49);
        assert_eq!(flat.signal, Signal::Hold);
    }

    #[test]
    fn zero_price_has_no_percent_edge() {
        let a = evaluate(&summary(0.10, 0.05, 0.15), 0.0);
        assert_eq!(a.ev_percent, 0.0);
        assert_eq!(a.kelly_fraction, 0.0);
        assert_eq!(a.signal, Signal::Hold);
    }

    #[test]
    fn confidence_thresholds() {
        assert_eq!(Confidence::from_ci_width(0.099), Confidence::High);
        assert_eq!(Confidence::from_ci_width(0.10), Confidence::Medium);
        assert_eq!(Confidence::from_ci_width(0.25), Confidence::Low);
    }
}
