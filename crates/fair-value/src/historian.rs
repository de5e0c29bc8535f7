//! Historical-precedent forecaster.
//!
//! Asks a model for past events resembling the question, then reads off a
//! base rate and a precedent-only probability. Usable on its own or as one
//! voice in the consensus.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tradedesk_core::{EstimateSource, FairValueEstimate};

use crate::error::{FairValueError, Result};
use crate::estimator::{ProbabilityEstimator, Recommendation, Vote, VoteConfidence};
use crate::llm::{strip_code_fences, Completion, Llm};

const SYSTEM_PROMPT: &str =
    "You are a historian and prediction market analyst. Respond only in valid JSON.";

/// How the market price compares with the historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketAssessment {
    Underpriced,
    Overpriced,
    Fair,
}

impl MarketAssessment {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Underpriced => "UNDERPRICED",
            Self::Overpriced => "OVERPRICED",
            Self::Fair => "FAIR",
        }
    }

    /// Trade direction on YES implied by the assessment.
    #[must_use]
    pub fn recommendation(&self) -> Recommendation {
        match self {
            Self::Underpriced => Recommendation::Buy,
            Self::Overpriced => Recommendation::Sell,
            Self::Fair => Recommendation::Hold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalParallel {
    pub event: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub outcome: String,
    /// 1 (loose) to 10 (near identical).
    #[serde(default)]
    pub similarity: u8,
    #[serde(default)]
    pub key_difference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAnalysis {
    #[serde(default)]
    pub parallels: Vec<HistoricalParallel>,
    /// Share of the closest precedents that resolved the same way.
    pub base_rate: f64,
    #[serde(default)]
    pub sample_size: u32,
    /// Probability of YES from precedent alone.
    pub historical_probability: f64,
    pub market_assessment: MarketAssessment,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "default_confidence")]
    pub confidence: VoteConfidence,
}

fn default_confidence() -> VoteConfidence {
    VoteConfidence::Low
}

impl HistoricalAnalysis {
    /// The band spans the base rate and the adjusted probability.
    #[must_use]
    pub fn to_estimate(&self) -> FairValueEstimate {
        let low = self.base_rate.min(self.historical_probability);
        let high = self.base_rate.max(self.historical_probability);
        FairValueEstimate {
            median_probability: self.historical_probability,
            confidence_interval: (low, high),
            source: EstimateSource::Historical,
            sample_size: self.sample_size as usize,
        }
    }
}

#[must_use]
pub fn historian_prompt(question: &str, market_price: f64) -> String {
    format!(
        r#"Prediction market question: "{question}"
Current market price (YES): {:.1}%

Find 3-5 historical events most similar to this situation. For each, note how it
resolved and how closely it matches. From them, derive a base rate and a
probability for this question based on precedent alone, then judge whether the
market price is UNDERPRICED, OVERPRICED, or FAIR against that record.

Respond ONLY in JSON format:
{{"parallels": [{{"event": "...", "date": "...", "outcome": "...", "similarity": 1-10, "key_difference": "..."}}],
 "base_rate": 0.XX, "sample_size": N, "historical_probability": 0.XX,
 "market_assessment": "UNDERPRICED|OVERPRICED|FAIR", "reasoning": "...",
 "confidence": "HIGH|MEDIUM|LOW"}}"#,
        market_price * 100.0
    )
}

/// Parses a historian reply.
///
/// # Errors
/// Returns [`FairValueError::Parse`] for malformed JSON, an unknown
/// assessment, or a rate outside `[0, 1]`.
pub fn parse_historical(reply: &str) -> Result<HistoricalAnalysis> {
    let mut analysis: HistoricalAnalysis = serde_json::from_str(strip_code_fences(reply))
        .map_err(|e| FairValueError::parse(format!("historical analysis: {e}")))?;
    for (name, value) in [
        ("base_rate", analysis.base_rate),
        ("historical_probability", analysis.historical_probability),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(FairValueError::parse(format!(
                "historical analysis: {name} {value} outside [0, 1]"
            )));
        }
    }
    for parallel in &mut analysis.parallels {
        parallel.similarity = parallel.similarity.min(10);
    }
    Ok(analysis)
}

/// Estimator that reasons from precedent rather than forecasting directly.
pub struct HistorianEstimator {
    id: String,
    llm: Arc<dyn Llm>,
}

impl HistorianEstimator {
    pub fn new(id: impl Into<String>, llm: Arc<dyn Llm>) -> Self {
        Self { id: id.into(), llm }
    }

    /// Full analysis including the precedents behind the probability.
    ///
    /// # Errors
    /// Propagates provider failures and unparseable replies.
    pub async fn analyze(&self, question: &str, market_price: f64) -> Result<HistoricalAnalysis> {
        let prompt = historian_prompt(question, market_price);
        let reply = self
            .llm
            .complete(&Completion {
                system: SYSTEM_PROMPT,
                user: &prompt,
                temperature: 0.3,
                max_tokens: 1500,
            })
            .await?;
        let analysis = parse_historical(&reply)?;
        tracing::debug!(
            estimator = %self.id,
            parallels = analysis.parallels.len(),
            probability = analysis.historical_probability,
            "historical analysis parsed"
        );
        Ok(analysis)
    }
}

impl std::fmt::Debug for HistorianEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistorianEstimator")
            .field("id", &self.id)
            .field("provider", &self.llm.name())
            .field("model", &self.llm.model())
            .finish()
    }
}

#[async_trait]
impl ProbabilityEstimator for HistorianEstimator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn estimate(&self, question: &str, market_price: f64) -> Result<Vote> {
        let analysis = self.analyze(question, market_price).await?;
        Ok(Vote {
            estimator_id: self.id.clone(),
            probability: analysis.historical_probability,
            recommendation: analysis.market_assessment.recommendation(),
            confidence: analysis.confidence,
            reasoning: analysis.reasoning,
        })
    }
}
