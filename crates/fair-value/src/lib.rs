//! Fair-value estimation for binary questions.
//!
//! Two independent estimators:
//!
//! - [`simulation`]: Beta-sampled driver variables, summarized into a median
//!   and a 95% band, then compared with the market price by [`evaluation`]
//! - [`consensus`]: several language-model forecasters polled in parallel,
//!   aggregated into a mean probability, a majority direction, and a
//!   conviction score
//!
//! [`extraction`] turns a question into simulation variables via a model.
//! [`historian`] estimates from historical precedent, alone or as a
//! consensus voice.

pub mod consensus;
pub mod error;
pub mod estimator;
pub mod evaluation;
pub mod extraction;
pub mod historian;
pub mod llm;
pub mod simulation;

pub use consensus::{aggregate, ConsensusEngine, ConsensusResult, ProviderKeys};
pub use error::{FairValueError, LlmError, Result};
pub use estimator::{LlmEstimator, ProbabilityEstimator, Recommendation, Vote, VoteConfidence};
pub use evaluation::{evaluate, Confidence, EdgeAssessment, Signal};
pub use extraction::{extract_variables, parse_extraction, VariableExtraction};
pub use historian::{
    parse_historical, HistorianEstimator, HistoricalAnalysis, HistoricalParallel, MarketAssessment,
};
pub use llm::{AnthropicClient, Completion, Llm, OpenAiClient};
pub use simulation::{simulate, Direction, SimulationConfig, SimulationSummary, Variable};
