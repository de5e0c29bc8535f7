//! Independent probability estimators polled by the consensus engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{FairValueError, Result};
use crate::llm::{strip_code_fences, Completion, Llm};

const SYSTEM_PROMPT: &str =
    "You are an independent prediction market forecaster. Respond only in valid JSON.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteConfidence {
    High,
    Medium,
    Low,
}

/// One estimator's answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vote {
    pub estimator_id: String,
    /// Probability of YES in `[0, 1]`.
    pub probability: f64,
    pub recommendation: Recommendation,
    pub confidence: VoteConfidence,
    pub reasoning: String,
}

#[async_trait]
pub trait ProbabilityEstimator: Send + Sync {
    /// Stable identity; votes are ordered by it.
    fn id(&self) -> &str;

    async fn estimate(&self, question: &str, market_price: f64) -> Result<Vote>;
}

#[derive(Debug, Deserialize)]
struct RawVote {
    probability: f64,
    recommendation: Recommendation,
    #[serde(default = "default_confidence")]
    confidence: VoteConfidence,
    #[serde(default)]
    reasoning: String,
}

fn default_confidence() -> VoteConfidence {
    VoteConfidence::Low
}

#[must_use]
pub fn estimate_prompt(question: &str, market_price: f64) -> String {
    format!(
        r#"Prediction market question: "{question}"
Current market price (YES): {market_price}

Estimate the true probability that this resolves YES, independently of the market price.
Then recommend BUY if YES is underpriced, SELL if overpriced, HOLD otherwise.

Respond ONLY in JSON format:
{{"probability": 0.XX, "recommendation": "BUY|SELL|HOLD", "confidence": "HIGH|MEDIUM|LOW", "reasoning": "..."}}"#
    )
}

/// Parses an estimator reply into a vote.
///
/// # Errors
/// Returns [`FairValueError::Parse`] for malformed JSON or a probability
/// outside `[0, 1]`.
pub fn parse_vote(estimator_id: &str, reply: &str) -> Result<Vote> {
    let raw: RawVote = serde_json::from_str(strip_code_fences(reply))
        .map_err(|e| FairValueError::parse(format!("{estimator_id}: {e}")))?;
    if !(0.0..=1.0).contains(&raw.probability) {
        return Err(FairValueError::parse(format!(
            "{estimator_id}: probability {} outside [0, 1]",
            raw.probability
        )));
    }
    Ok(Vote {
        estimator_id: estimator_id.to_string(),
        probability: raw.probability,
        recommendation: raw.recommendation,
        confidence: raw.confidence,
        reasoning: raw.reasoning,
    })
}

/// Estimator backed by a chat model.
pub struct LlmEstimator {
    id: String,
    llm: Arc<dyn Llm>,
}

impl LlmEstimator {
    pub fn new(id: impl Into<String>, llm: Arc<dyn Llm>) -> Self {
        Self { id: id.into(), llm }
    }
}

impl std::fmt::Debug for LlmEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmEstimator")
            .field("id", &self.id)
            .field("provider", &self.llm.name())
            .field("model", &self.llm.model())
            .finish()
    }
}

#[async_trait]
impl ProbabilityEstimator for LlmEstimator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn estimate(&self, question: &str, market_price: f64) -> Result<Vote> {
        let prompt = estimate_prompt(question, market_price);
        let reply = self
            .llm
            .complete(&Completion {
                system: SYSTEM_PROMPT,
                user: &prompt,
                temperature: 0.3,
                max_tokens: 500,
            })
            .await?;
        parse_vote(&self.id, &reply)
    }
}
