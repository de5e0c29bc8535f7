//! Full risk analysis for one position idea.

use serde::Serialize;
use thiserror::Error;
use tradedesk_core::{RiskGrade, RiskLimits, SizingResult};

use crate::kelly::{kelly, position_size, KellyFractions};
use crate::ruin::risk_of_ruin;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RiskError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// What to do with the idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    /// Strong edge.
    Proceed,
    /// Moderate edge; half Kelly.
    Cautious,
    /// Small edge; quarter Kelly or skip.
    Marginal,
    /// No positive EV.
    Pass,
}

impl Recommendation {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Proceed => "🟢 PROCEED: Strong edge detected",
            Self::Cautious => "🟡 CAUTIOUS: Moderate edge, use Half Kelly",
            Self::Marginal => "⚪ MARGINAL: Small edge, use Quarter Kelly or skip",
            Self::Pass => "🔴 PASS: No positive EV detected",
        }
    }
}

/// Bucket for a half-Kelly fraction.
#[must_use]
pub fn grade(half_kelly: f64) -> RiskGrade {
    if half_kelly < 0.02 {
        RiskGrade::Low
    } else if half_kelly < 0.05 {
        RiskGrade::Moderate
    } else if half_kelly < 0.10 {
        RiskGrade::Aggressive
    } else {
        RiskGrade::High
    }
}

/// Suggested cap on simultaneously open positions.
#[must_use]
pub fn max_concurrent_positions(bankroll: f64) -> u32 {
    if bankroll < 100.0 {
        3
    } else if bankroll < 500.0 {
        5
    } else if bankroll < 2000.0 {
        8
    } else {
        12
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAnalysis {
    pub question: String,
    pub fair_prob: f64,
    pub market_price: f64,
    pub bankroll: f64,
    /// Fair probability minus market price.
    pub ev: f64,
    /// `ev` relative to the market price, in percent.
    pub ev_percent: f64,
    pub kelly: KellyFractions,
    pub full_usd: f64,
    /// Recommended stake.
    pub half_usd: f64,
    pub quarter_usd: f64,
    /// Profit on the half-Kelly stake if YES resolves.
    pub profit_if_win: f64,
    /// Loss on the half-Kelly stake if NO resolves.
    pub loss_if_lose: f64,
    pub risk_of_ruin_pct: f64,
    pub grade: RiskGrade,
    pub max_concurrent_positions: u32,
    pub max_single_position: f64,
    pub daily_loss_limit: f64,
    pub recommendation: Recommendation,
}

impl RiskAnalysis {
    /// Analyzes buying YES at `market_price` with `bankroll` available.
    ///
    /// # Errors
    /// Returns [`RiskError::InvalidInput`] for non-finite values, a fair
    /// probability outside `[0, 1]`, or a negative bankroll.
    pub fn analyze(
        question: impl Into<String>,
        fair_prob: f64,
        market_price: f64,
        bankroll: f64,
        limits: &RiskLimits,
    ) -> Result<Self, RiskError> {
        if ![fair_prob, market_price, bankroll].iter().all(|v| v.is_finite()) {
            return Err(RiskError::InvalidInput("inputs must be finite numbers".to_string()));
        }
        if !(0.0..=1.0).contains(&fair_prob) {
            return Err(RiskError::InvalidInput(format!(
                "fair probability {fair_prob} outside [0, 1]"
            )));
        }
        if bankroll < 0.0 {
            return Err(RiskError::InvalidInput(format!("negative bankroll {bankroll}")));
        }

        let ev = fair_prob - market_price;
        let ev_percent = if market_price > 0.0 {
            ev / market_price * 100.0
        } else {
            0.0
        };

        let fractions = kelly(fair_prob, market_price);
        let cap = limits.max_position_pct;
        let full_usd = position_size(fractions.full, bankroll, cap);
        let half_usd = position_size(fractions.half, bankroll, cap);
        let quarter_usd = position_size(fractions.quarter, bankroll, cap);

        let payout_per_share = if market_price > 0.0 {
            1.0 / market_price
        } else {
            0.0
        };
        let profit_if_win = if payout_per_share > 1.0 {
            half_usd * (payout_per_share - 1.0)
        } else {
            0.0
        };
        let loss_if_lose = half_usd;
        let risk_of_ruin_pct = risk_of_ruin(fair_prob, profit_if_win, loss_if_lose, bankroll);

        let recommendation = if ev_percent > 20.0 && fractions.full > 0.05 {
            Recommendation::Proceed
        } else if ev_percent > 5.0 && fractions.full > 0.02 {
            Recommendation::Cautious
        } else if ev_percent > 0.0 {
            Recommendation::Marginal
        } else {
            Recommendation::Pass
        };

        let analysis = Self {
            question: question.into(),
            fair_prob,
            market_price,
            bankroll,
            ev,
            ev_percent,
            kelly: fractions,
            full_usd,
            half_usd,
            quarter_usd,
            profit_if_win,
            loss_if_lose,
            risk_of_ruin_pct,
            grade: grade(fractions.half),
            max_concurrent_positions: max_concurrent_positions(bankroll),
            max_single_position: bankroll * limits.max_position_pct,
            daily_loss_limit: bankroll * limits.daily_loss_pct,
            recommendation,
        };
        tracing::debug!(
            ev_percent = analysis.ev_percent,
            full_kelly = analysis.kelly.full,
            grade = analysis.grade.label(),
            "risk analysis complete"
        );
        Ok(analysis)
    }

    #[must_use]
    pub fn sizing(&self) -> SizingResult {
        SizingResult {
            full_kelly: self.kelly.full,
            half_kelly: self.kelly.half,
            quarter_kelly: self.kelly.quarter,
            recommended_usd: self.half_usd,
            risk_of_ruin_pct: self.risk_of_ruin_pct,
            grade: self.grade,
        }
    }
}
