//! Variable-sampling simulation.
//!
//! Each trial draws every variable from a Beta distribution centred on its
//! base rate, sums the weighted signed deviations from those base rates, and
//! applies the total to the base probability. The distribution of outcomes
//! over all trials is the fair-value estimate.

use rand::distributions::Distribution;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Beta;
use tradedesk_core::{EstimateSource, FairValueEstimate, SimulationSettings};

use crate::error::{FairValueError, Result};

const PROB_FLOOR: f64 = 0.001;
const PROB_CEIL: f64 = 0.999;
/// Smallest Beta shape parameter; lower values pile mass at the bounds.
const MIN_SHAPE: f64 = 0.5;

/// Whether a variable rising makes YES more or less likely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    #[must_use]
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Positive => "↑",
            Self::Negative => "↓",
        }
    }
}

/// Anything other than "positive" counts as negative.
impl From<String> for Direction {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("positive") {
            Self::Positive
        } else {
            Self::Negative
        }
    }
}

impl From<Direction> for String {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Positive => "positive".to_string(),
            Direction::Negative => "negative".to_string(),
        }
    }
}

/// One driver of the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Expected value of the variable in `[0, 1]`.
    pub base_rate: f64,
    /// Uncertainty; 0 pins the variable to its base rate.
    pub volatility: f64,
    /// Influence on the outcome.
    pub weight: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub trials: usize,
    /// Fixed seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            seed: None,
        }
    }
}

impl From<&SimulationSettings> for SimulationConfig {
    fn from(settings: &SimulationSettings) -> Self {
        Self {
            trials: settings.trials,
            seed: settings.seed,
        }
    }
}

/// Distribution of simulated probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub trials: usize,
    pub median: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// 2.5th percentile.
    pub ci_low: f64,
    /// 97.5th percentile.
    pub ci_high: f64,
    pub p10: f64,
    pub p90: f64,
}

impl SimulationSummary {
    /// Width of the 95% band.
    #[must_use]
    pub fn ci_width(&self) -> f64 {
        self.ci_high - self.ci_low
    }

    #[must_use]
    pub fn to_estimate(&self) -> FairValueEstimate {
        FairValueEstimate {
            median_probability: self.median,
            confidence_interval: (self.ci_low, self.ci_high),
            source: EstimateSource::Simulation,
            sample_size: self.trials,
        }
    }
}

enum Sampler {
    Fixed,
    Beta(Beta),
}

impl Sampler {
    fn for_variable(v: &Variable) -> Result<Self> {
        if v.volatility <= 0.0 {
            return Ok(Self::Fixed);
        }
        let (alpha, beta) = if v.volatility < 1.0 {
            let scale = 1.0 / v.volatility - 1.0;
            (v.base_rate * scale, (1.0 - v.base_rate) * scale)
        } else {
            (2.0, 2.0)
        };
        Beta::new(alpha.max(MIN_SHAPE), beta.max(MIN_SHAPE))
            .map(Self::Beta)
            .map_err(|e| FairValueError::invalid(format!("variable {:?}: {e}", v.name)))
    }

    fn draw<R: rand::Rng>(&self, base: f64, rng: &mut R) -> f64 {
        match self {
            Self::Fixed => base,
            Self::Beta(beta) => beta.sample(rng),
        }
    }
}

fn validate(base_probability: f64, variables: &[Variable], config: &SimulationConfig) -> Result<()> {
    if config.trials == 0 {
        return Err(FairValueError::invalid("trials must be positive"));
    }
    if !(0.0..=1.0).contains(&base_probability) {
        return Err(FairValueError::invalid(format!(
            "base probability {base_probability} outside [0, 1]"
        )));
    }
    for v in variables {
        if !(0.0..=1.0).contains(&v.base_rate) {
            return Err(FairValueError::invalid(format!(
                "variable {:?} base rate {} outside [0, 1]",
                v.name, v.base_rate
            )));
        }
        if !v.volatility.is_finite() || !v.weight.is_finite() {
            return Err(FairValueError::invalid(format!(
                "variable {:?} has a non-finite parameter",
                v.name
            )));
        }
    }
    Ok(())
}

/// Runs the simulation.
///
/// # Errors
/// Returns [`FairValueError::InvalidInput`] for zero trials or parameters
/// outside their domain.
pub fn simulate(
    base_probability: f64,
    variables: &[Variable],
    config: &SimulationConfig,
) -> Result<SimulationSummary> {
    validate(base_probability, variables, config)?;

    let samplers = variables
        .iter()
        .map(Sampler::for_variable)
        .collect::<Result<Vec<_>>>()?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut outcomes: Vec<f64> = (0..config.trials)
        .map(|_| {
            let adjustment: f64 = variables
                .iter()
                .zip(&samplers)
                .map(|(v, sampler)| {
                    let drawn = sampler.draw(v.base_rate, &mut rng);
                    (drawn - v.base_rate) * v.direction.sign() * v.weight
                })
                .sum();
            (base_probability + adjustment).clamp(PROB_FLOOR, PROB_CEIL)
        })
        .collect();
    outcomes.sort_by(f64::total_cmp);

    let (mean, std_dev) = match (outcomes.first(), outcomes.last()) {
        (Some(lo), Some(hi)) if lo == hi => (*lo, 0.0),
        _ => {
            let n = outcomes.len() as f64;
            let mean = outcomes.iter().sum::<f64>() / n;
            let variance = outcomes.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        }
    };

    let summary = SimulationSummary {
        trials: config.trials,
        median: percentile(&outcomes, 50.0),
        mean,
        std_dev,
        ci_low: percentile(&outcomes, 2.5),
        ci_high: percentile(&outcomes, 97.5),
        p10: percentile(&outcomes, 10.0),
        p90: percentile(&outcomes, 90.0),
    };
    tracing::debug!(
        trials = summary.trials,
        variables = variables.len(),
        median = summary.median,
        "simulation complete"
    );
    Ok(summary)
}

/// Percentile of sorted data, interpolating linearly between order
/// statistics.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let rank = pct / 100.0 * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(base_rate: f64, volatility: f64, weight: f64, direction: Direction) -> Variable {
        Variable {
            name: "driver".to_string(),
            description: String::new(),
            base_rate,
            volatility,
            weight,
            direction,
        }
    }

    fn seeded(trials: usize) -> SimulationConfig {
        SimulationConfig {
            trials,
            seed: Some(42),
        }
    }

    #[test]
    fn no_variables_returns_base_probability() {
        let summary = simulate(0.3, &[], &seeded(1_000)).unwrap();
        assert!((summary.median - 0.3).abs() < 1e-12);
        assert!((summary.mean - 0.3).abs() < 1e-12);
        assert_eq!(summary.std_dev, 0.0);
        assert!((summary.ci_low - 0.3).abs() < 1e-12);
        assert!((summary.ci_high - 0.3).abs() < 1e-12);
    }

    #[test]
    fn zero_volatility_pins_variables() {
        let vars = [variable(0.7, 0.0, 0.5, Direction::Positive)];
        let summary = simulate(0.4, &vars, &seeded(500)).unwrap();
        assert!((summary.median - 0.4).abs() < 1e-12);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn output_is_clipped() {
        let summary = simulate(1.0, &[], &seeded(10)).unwrap();
        assert_eq!(summary.median, PROB_CEIL);
        let summary = simulate(0.0, &[], &seeded(10)).unwrap();
        assert_eq!(summary.median, PROB_FLOOR);
    }

    #[test]
    fn same_seed_same_summary() {
        let vars = [
            variable(0.6, 0.2, 0.4, Direction::Positive),
            variable(0.3, 0.1, 0.3, Direction::Negative),
        ];
        let a = simulate(0.5, &vars, &seeded(2_000)).unwrap();
        let b = simulate(0.5, &vars, &seeded(2_000)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn uncertain_variables_spread_the_outcome() {
        let vars = [variable(0.5, 0.3, 0.5, Direction::Positive)];
        let summary = simulate(0.5, &vars, &seeded(10_000)).unwrap();
        assert!(summary.std_dev > 0.01);
        assert!(summary.ci_low < summary.p10);
        assert!(summary.p10 < summary.median);
        assert!(summary.median < summary.p90);
        assert!(summary.p90 < summary.ci_high);
        // Symmetric Beta around the base rate keeps the centre near 0.5.
        assert!((summary.median - 0.5).abs() < 0.02);
        assert!(summary.ci_low >= PROB_FLOOR && summary.ci_high <= PROB_CEIL);
    }

    #[test]
    fn invalid_inputs_rejected() {
        assert!(matches!(
            simulate(0.5, &[], &seeded(0)),
            Err(FairValueError::InvalidInput(_))
        ));
        assert!(simulate(1.5, &[], &seeded(10)).is_err());
        let bad = [variable(1.2, 0.1, 0.5, Direction::Positive)];
        assert!(simulate(0.5, &bad, &seeded(10)).is_err());
        let nan = [variable(0.5, f64::NAN, 0.5, Direction::Positive)];
        assert!(simulate(0.5, &nan, &seeded(10)).is_err());
    }

    #[test]
    fn percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 50.0), 2.5);
        assert_eq!(percentile(&data, 100.0), 4.0);
        assert!((percentile(&data, 10.0) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn direction_parses_leniently() {
        let v: Variable = serde_json::from_str(
            r#"{"name":"x","base_rate":0.5,"volatility":0.1,"weight":0.2,"direction":"Positive"}"#,
        )
        .unwrap();
        assert_eq!(v.direction, Direction::Positive);
        assert_eq!(Direction::from("down".to_string()), Direction::Negative);
    }

    #[test]
    fn estimate_uses_simulation_source() {
        let estimate = simulate(0.3, &[], &seeded(100)).unwrap().to_estimate();
        assert_eq!(estimate.source, EstimateSource::Simulation);
        assert_eq!(estimate.sample_size, 100);
    }
}
