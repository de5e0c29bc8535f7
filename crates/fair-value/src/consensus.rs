//! Parallel multi-estimator consensus.
//!
//! Estimators are polled concurrently with a bounded number in flight and a
//! per-call timeout. A failed or slow estimator casts no vote; the rest are
//! aggregated. Votes are re-sorted by estimator id before aggregation so the
//! result never depends on completion order.

use futures_util::stream::{self, StreamExt};
use secrecy::SecretString;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tradedesk_core::{
    ConsensusConfig, EstimateSource, EstimatorConfig, EstimatorKind, EstimatorProvider,
    FairValueEstimate,
};

use crate::error::{FairValueError, Result};
use crate::estimator::{LlmEstimator, ProbabilityEstimator, Recommendation, Vote};
use crate::historian::HistorianEstimator;
use crate::llm::{AnthropicClient, Llm, OpenAiClient};

const BASE_CONVICTION: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub market_price: f64,
    /// Successful votes, sorted by estimator id.
    pub votes: Vec<Vote>,
    /// `(estimator id, error)` for every estimator that cast no vote.
    pub failures: Vec<(String, String)>,
    pub mean_probability: f64,
    pub median_probability: f64,
    pub min_probability: f64,
    pub max_probability: f64,
    /// Max minus min probability across votes.
    pub spread: f64,
    /// Majority recommendation; ties resolve to hold.
    pub direction: Recommendation,
    /// Share of votes backing the largest recommendation bloc.
    pub agreement: f64,
    /// Mean probability's edge over the market price, in percent.
    pub ev_percent: f64,
    /// 1 (weak) to 10 (strong).
    pub conviction: u8,
}

impl ConsensusResult {
    #[must_use]
    pub fn to_estimate(&self) -> FairValueEstimate {
        FairValueEstimate {
            median_probability: self.median_probability,
            confidence_interval: (self.min_probability, self.max_probability),
            source: EstimateSource::Consensus,
            sample_size: self.votes.len(),
        }
    }
}

pub struct ConsensusEngine {
    estimators: Vec<Arc<dyn ProbabilityEstimator>>,
    workers: usize,
    timeout: Duration,
}

impl std::fmt::Debug for ConsensusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<_> = self.estimators.iter().map(|e| e.id()).collect();
        f.debug_struct("ConsensusEngine")
            .field("estimators", &ids)
            .field("workers", &self.workers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// API keys for the model providers. A missing key drops that provider's
/// estimators.
#[derive(Default)]
pub struct ProviderKeys {
    pub openai: Option<SecretString>,
    pub anthropic: Option<SecretString>,
}

impl ProviderKeys {
    /// Client for the provider named by `spec`, or `None` without its key.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn client_for(
        &self,
        spec: &EstimatorConfig,
        timeout: Duration,
    ) -> Result<Option<Arc<dyn Llm>>> {
        let base_url = spec
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());
        let client: Arc<dyn Llm> = match (spec.provider, &self.openai, &self.anthropic) {
            (EstimatorProvider::OpenAi, Some(key), _) => {
                let client = OpenAiClient::new(key.clone(), &spec.model, timeout)?;
                Arc::new(match base_url {
                    Some(url) => client.with_base_url(url),
                    None => client,
                })
            }
            (EstimatorProvider::Anthropic, _, Some(key)) => {
                let client = AnthropicClient::new(key.clone(), &spec.model, timeout)?;
                Arc::new(match base_url {
                    Some(url) => client.with_base_url(url),
                    None => client,
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(client))
    }

    #[must_use]
    pub fn has(&self, provider: EstimatorProvider) -> bool {
        match provider {
            EstimatorProvider::OpenAi => self.openai.is_some(),
            EstimatorProvider::Anthropic => self.anthropic.is_some(),
        }
    }
}

impl ConsensusEngine {
    #[must_use]
    pub fn new(estimators: Vec<Arc<dyn ProbabilityEstimator>>, workers: usize, timeout: Duration) -> Self {
        Self {
            estimators,
            workers: workers.max(1),
            timeout,
        }
    }

    /// Builds one LLM estimator per configured model whose provider key is
    /// present.
    ///
    /// # Errors
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &ConsensusConfig, keys: &ProviderKeys) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut estimators: Vec<Arc<dyn ProbabilityEstimator>> = Vec::new();

        for spec in &config.estimators {
            let Some(llm) = keys.client_for(spec, timeout)? else {
                tracing::debug!(estimator = %spec.id, "provider key missing, estimator skipped");
                continue;
            };
            let estimator: Arc<dyn ProbabilityEstimator> = match spec.kind {
                EstimatorKind::Forecaster => Arc::new(LlmEstimator::new(&spec.id, llm)),
                EstimatorKind::Historian => Arc::new(HistorianEstimator::new(&spec.id, llm)),
            };
            estimators.push(estimator);
        }

        Ok(Self::new(estimators, config.workers, timeout))
    }

    #[must_use]
    pub fn estimator_count(&self) -> usize {
        self.estimators.len()
    }

    /// Polls every estimator and aggregates the votes.
    ///
    /// # Errors
    /// Returns [`FairValueError::NoEstimates`] when no estimator produced a
    /// vote, and [`FairValueError::InvalidInput`] for a non-finite price.
    pub async fn run(&self, question: &str, market_price: f64) -> Result<ConsensusResult> {
        if !market_price.is_finite() {
            return Err(FairValueError::invalid("market price must be finite"));
        }

        let timeout = self.timeout;
        let outcomes: Vec<(String, Result<Vote>)> = stream::iter(self.estimators.iter().cloned())
            .map(|estimator| async move {
                let id = estimator.id().to_string();
                let outcome =
                    match tokio::time::timeout(timeout, estimator.estimate(question, market_price)).await {
                        Ok(result) => result,
                        Err(_) => Err(FairValueError::Timeout(timeout)),
                    };
                (id, outcome)
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut votes = Vec::new();
        let mut failures = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(vote) => votes.push(vote),
                Err(e) => {
                    tracing::warn!(estimator = %id, error = %e, "estimator failed");
                    failures.push((id, e.to_string()));
                }
            }
        }
        votes.sort_by(|a, b| a.estimator_id.cmp(&b.estimator_id));
        failures.sort();

        aggregate(votes, failures, market_price)
    }
}

/// Aggregates sorted votes.
///
/// # Errors
/// Returns [`FairValueError::NoEstimates`] for an empty vote list.
pub fn aggregate(
    votes: Vec<Vote>,
    failures: Vec<(String, String)>,
    market_price: f64,
) -> Result<ConsensusResult> {
    if votes.is_empty() {
        return Err(FairValueError::NoEstimates {
            attempted: failures.len(),
        });
    }

    let n = votes.len() as f64;
    let mut probabilities: Vec<f64> = votes.iter().map(|v| v.probability).collect();
    probabilities.sort_by(f64::total_cmp);

    let mean_probability = probabilities.iter().sum::<f64>() / n;
    let median_probability = median(&probabilities);
    let min_probability = probabilities[0];
    let max_probability = probabilities[probabilities.len() - 1];
    let spread = max_probability - min_probability;

    let (direction, top_count) = majority(&votes);
    let agreement = top_count as f64 / n;

    let ev_percent = if market_price > 0.0 {
        (mean_probability - market_price) / market_price * 100.0
    } else {
        0.0
    };
    let conviction = conviction(agreement, ev_percent, spread);

    tracing::debug!(
        votes = votes.len(),
        failed = failures.len(),
        mean = mean_probability,
        direction = direction.label(),
        conviction,
        "consensus aggregated"
    );

    Ok(ConsensusResult {
        market_price,
        votes,
        failures,
        mean_probability,
        median_probability,
        min_probability,
        max_probability,
        spread,
        direction,
        agreement,
        ev_percent,
        conviction,
    })
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Largest recommendation bloc and its size. A tie for the top spot is a hold.
fn majority(votes: &[Vote]) -> (Recommendation, usize) {
    let count = |r: Recommendation| votes.iter().filter(|v| v.recommendation == r).count();
    let tallies = [
        (Recommendation::Buy, count(Recommendation::Buy)),
        (Recommendation::Sell, count(Recommendation::Sell)),
        (Recommendation::Hold, count(Recommendation::Hold)),
    ];
    let top = tallies.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let leaders: Vec<_> = tallies.iter().filter(|(_, c)| *c == top).collect();
    match leaders.as_slice() {
        [(only, _)] => (*only, top),
        _ => (Recommendation::Hold, top),
    }
}

fn conviction(agreement: f64, ev_percent: f64, spread: f64) -> u8 {
    let mut score = BASE_CONVICTION;
    if agreement >= 0.75 {
        score += 2;
    }
    if agreement >= 1.0 {
        score += 1;
    }
    if ev_percent.abs() > 20.0 {
        score += 1;
    }
    if spread > 0.3 {
        score -= 2;
    }
    // Clamped to 1..=10, so the cast is lossless.
    score.clamp(1, 10) as u8
}
