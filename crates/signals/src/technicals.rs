//! Price-history indicators for the crypto underlyings behind price-threshold
//! markets.
//!
//! All inputs are daily closes, oldest first. EMAs are seeded with the first
//! price; RSI uses plain averages of the last `period` moves; Bollinger bands
//! use the population standard deviation.

use serde::Serialize;

/// Indicator windows and signal thresholds.
#[derive(Debug, Clone)]
pub struct TechnicalsConfig {
    pub rsi_period: usize,
    /// RSI above this reads as overbought
    pub overbought: f64,
    /// RSI below this reads as oversold
    pub oversold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    /// Band half-width in standard deviations
    pub bollinger_width: f64,
    /// Closes required before any snapshot is produced
    pub min_history: usize,
}

impl Default for TechnicalsConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            overbought: 70.0,
            oversold: 30.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_width: 2.0,
            min_history: 30, // covers the 30-day change
        }
    }
}

/// Simple moving average for every full window.
///
/// # Returns
/// One value per window of `period` closes; empty when the series is shorter
/// than the period.
#[must_use]
pub fn sma(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    prices
        .windows(period)
        .map(|window| window.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Exponential moving average seeded with the first close.
///
/// # Returns
/// One value per close, or empty when the series is shorter than the period.
#[must_use]
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(prices.len());
    let mut current = prices[0];
    out.push(current);
    for price in &prices[1..] {
        current = price * k + current * (1.0 - k);
        out.push(current);
    }
    out
}

/// Relative strength index over the last `period` moves.
///
/// # Returns
/// `None` without `period + 1` closes. 100 when there were no losses.
#[must_use]
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }
    let recent = &prices[prices.len() - period - 1..];
    let (gains, losses) = recent
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), delta| {
            if delta > 0.0 {
                (gains + delta, losses)
            } else {
                (gains, losses - delta)
            }
        });
    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Macd {
    /// Fast EMA minus slow EMA.
    pub line: f64,
    /// EMA of the line.
    pub signal: f64,
    pub histogram: f64,
}

/// MACD at the latest close.
///
/// # Returns
/// `None` without `slow + signal` closes.
#[must_use]
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if prices.len() < slow + signal {
        return None;
    }
    let fast_ema = ema(prices, fast);
    let slow_ema = ema(prices, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal);
    let line = *line.last()?;
    let signal = *signal_line.last()?;
    Some(Macd {
        line,
        signal,
        histogram: line - signal,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bands around the mean of the last `period` closes.
#[must_use]
pub fn bollinger(prices: &[f64], period: usize, width: f64) -> Option<BollingerBands> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / period as f64;
    let band = variance.sqrt() * width;
    Some(BollingerBands {
        upper: mean + band,
        middle: mean,
        lower: mean - band,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TechnicalSignal {
    RsiOverbought,
    RsiOversold,
    RsiNeutral,
    MacdBullish,
    MacdBearish,
    AboveUpperBand,
    BelowLowerBand,
    /// 50-day average above the 200-day.
    GoldenCross,
    DeathCross,
}

impl TechnicalSignal {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::RsiOverbought => "RSI overbought",
            Self::RsiOversold => "RSI oversold",
            Self::RsiNeutral => "RSI neutral",
            Self::MacdBullish => "MACD bullish",
            Self::MacdBearish => "MACD bearish",
            Self::AboveUpperBand => "Price above upper Bollinger band",
            Self::BelowLowerBand => "Price below lower Bollinger band",
            Self::GoldenCross => "50-day SMA above 200-day",
            Self::DeathCross => "50-day SMA below 200-day",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSnapshot {
    pub asset: String,
    pub current: f64,
    pub high_30d: f64,
    pub low_30d: f64,
    /// Percent change over the last 7 closes.
    pub change_7d_pct: f64,
    pub change_30d_pct: f64,
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub bollinger: Option<BollingerBands>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub signals: Vec<TechnicalSignal>,
}

fn pct_change(prices: &[f64], lookback: usize) -> f64 {
    let last = prices[prices.len() - 1];
    let base = prices[prices.len() - lookback];
    if base <= 0.0 {
        return 0.0;
    }
    (last / base - 1.0) * 100.0
}

/// Computes every indicator for a close series.
///
/// # Returns
/// `None` when fewer than `config.min_history` finite closes are given.
#[must_use]
pub fn analyze_prices(
    asset: &str,
    prices: &[f64],
    config: &TechnicalsConfig,
) -> Option<TechnicalSnapshot> {
    let min_history = config.min_history.max(30);
    if prices.len() < min_history || prices.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let current = prices[prices.len() - 1];
    let month = &prices[prices.len() - 30..];
    let high_30d = month.iter().copied().fold(f64::MIN, f64::max);
    let low_30d = month.iter().copied().fold(f64::MAX, f64::min);

    let rsi = rsi(prices, config.rsi_period);
    let macd = macd(prices, config.macd_fast, config.macd_slow, config.macd_signal);
    let bollinger = bollinger(prices, config.bollinger_period, config.bollinger_width);
    let sma_50 = sma(&prices[prices.len().saturating_sub(50)..], 50).last().copied();
    let sma_200 = sma(&prices[prices.len().saturating_sub(200)..], 200).last().copied();

    let mut signals = Vec::new();
    if let Some(value) = rsi {
        signals.push(if value > config.overbought {
            TechnicalSignal::RsiOverbought
        } else if value < config.oversold {
            TechnicalSignal::RsiOversold
        } else {
            TechnicalSignal::RsiNeutral
        });
    }
    if let Some(m) = macd {
        if m.histogram > 0.0 {
            signals.push(TechnicalSignal::MacdBullish);
        } else if m.histogram < 0.0 {
            signals.push(TechnicalSignal::MacdBearish);
        }
    }
    if let Some(bands) = bollinger {
        if current > bands.upper {
            signals.push(TechnicalSignal::AboveUpperBand);
        } else if current < bands.lower {
            signals.push(TechnicalSignal::BelowLowerBand);
        }
    }
    if let (Some(short), Some(long)) = (sma_50, sma_200) {
        signals.push(if short > long {
            TechnicalSignal::GoldenCross
        } else {
            TechnicalSignal::DeathCross
        });
    }

    Some(TechnicalSnapshot {
        asset: asset.to_string(),
        current,
        high_30d,
        low_30d,
        change_7d_pct: pct_change(prices, 7),
        change_30d_pct: pct_change(prices, 30),
        rsi,
        macd,
        bollinger,
        sma_50,
        sma_200,
        signals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn sma_covers_full_windows_only() {
        assert_eq!(sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3), vec![2.0, 3.0, 4.0]);
        assert!(sma(&[1.0, 2.0], 3).is_empty());
    }

    #[test]
    fn ema_is_seeded_with_first_close() {
        let values = ema(&[1.0, 2.0, 3.0], 2);
        assert_eq!(values.len(), 3);
        assert!(close(values[0], 1.0));
        assert!(close(values[1], 5.0 / 3.0));
        assert!(close(values[2], 2.0 + 5.0 / 9.0));
    }

    #[test]
    fn rsi_from_average_gain_and_loss() {
        // moves +1, -0.5 → RS 2
        let value = rsi(&[10.0, 11.0, 10.5], 2).unwrap();
        assert!(close(value, 100.0 - 100.0 / 3.0));
        assert_eq!(rsi(&[1.0, 2.0, 3.0, 4.0], 3), Some(100.0));
        assert_eq!(rsi(&[1.0, 2.0], 3), None);
    }

    #[test]
    fn bollinger_uses_population_deviation() {
        let prices: Vec<f64> = (1..=20).map(f64::from).collect();
        let bands = bollinger(&prices, 20, 2.0).unwrap();
        assert!(close(bands.middle, 10.5));
        assert!(close(bands.upper - bands.middle, 2.0 * 33.25_f64.sqrt()));

        let flat = bollinger(&[5.0; 20], 20, 2.0).unwrap();
        assert_eq!(flat.upper, flat.lower);
    }

    #[test]
    fn macd_needs_slow_plus_signal_closes() {
        assert!(macd(&rising(34), 12, 26, 9).is_none());
        let m = macd(&rising(35), 12, 26, 9).unwrap();
        assert!(m.line > 0.0);
        assert!(m.histogram > 0.0);

        let flat = macd(&[50.0; 40], 12, 26, 9).unwrap();
        assert!(close(flat.line, 0.0));
        assert!(close(flat.histogram, 0.0));
    }

    #[test]
    fn short_history_yields_nothing() {
        let config = TechnicalsConfig::default();
        assert!(analyze_prices("bitcoin", &rising(29), &config).is_none());
        let mut gapped = rising(40);
        gapped[10] = f64::NAN;
        assert!(analyze_prices("bitcoin", &gapped, &config).is_none());
    }

    #[test]
    fn steady_uptrend_reads_overbought_and_bullish() {
        let prices = rising(60);
        let snapshot = analyze_prices("bitcoin", &prices, &TechnicalsConfig::default()).unwrap();
        assert_eq!(snapshot.current, 159.0);
        assert_eq!(snapshot.high_30d, 159.0);
        assert_eq!(snapshot.low_30d, 130.0);
        assert!(close(snapshot.change_7d_pct, (159.0 / 153.0 - 1.0) * 100.0));
        assert!(close(snapshot.sma_50.unwrap(), 134.5));
        assert_eq!(snapshot.sma_200, None);
        assert!(snapshot.signals.contains(&TechnicalSignal::RsiOverbought));
        assert!(snapshot.signals.contains(&TechnicalSignal::MacdBullish));
        assert!(!snapshot.signals.contains(&TechnicalSignal::GoldenCross));
    }

    #[test]
    fn long_downtrend_reads_death_cross() {
        let prices: Vec<f64> = (0..220).map(|i| 500.0 - i as f64).collect();
        let snapshot = analyze_prices("ethereum", &prices, &TechnicalsConfig::default()).unwrap();
        assert!(snapshot.signals.contains(&TechnicalSignal::RsiOversold));
        assert!(snapshot.signals.contains(&TechnicalSignal::MacdBearish));
        assert!(snapshot.signals.contains(&TechnicalSignal::DeathCross));
    }
}
