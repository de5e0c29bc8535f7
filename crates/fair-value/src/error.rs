//! Error types for fair-value estimation.

use std::time::Duration;
use thiserror::Error;

/// Failure talking to a language model provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// Network failure or timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response.
    #[error("provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// 2xx response without the expected content.
    #[error("unexpected response: {0}")]
    Schema(String),
}

impl LlmError {
    pub(crate) fn rejected(status: u16, body: &str) -> Self {
        Self::Rejected {
            status,
            body: tradedesk_core::truncate_detail(body),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Schema(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FairValueError {
    /// Every estimator failed; there is no probability to report.
    #[error("no estimator responded ({attempted} attempted)")]
    NoEstimates { attempted: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A model answered, but not in the expected JSON shape.
    #[error("could not parse model output: {0}")]
    Parse(String),

    #[error("estimator timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl FairValueError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FairValueError>;
