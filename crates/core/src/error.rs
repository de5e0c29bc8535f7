//! Error taxonomy for venue interactions.
//!
//! Missing credentials are not an error: adapters report them as
//! [`BalanceStatus::Unconfigured`](crate::types::BalanceStatus::Unconfigured).
//! Everything that does go wrong is caught inside the adapter and carried as
//! one of the variants below.

use thiserror::Error;

/// Maximum number of characters of remote error text kept in an error.
pub const ERROR_DETAIL_LIMIT: usize = 120;

/// Errors that can occur when talking to a venue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueError {
    /// Network failure or timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The venue answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    RemoteRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated to [`ERROR_DETAIL_LIMIT`] characters.
        body: String,
    },

    /// 2xx response that could not be parsed or lacked expected fields.
    #[error("unexpected response: {0}")]
    SchemaMismatch(String),

    /// Key material could not be used to sign the request.
    #[error("signing failed: {0}")]
    SigningFailure(String),
}

impl VenueError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(truncate_detail(&message.into()))
    }

    /// Creates a rejection error, truncating the body.
    pub fn rejected(status: u16, body: &str) -> Self {
        Self::RemoteRejected {
            status,
            body: truncate_detail(body),
        }
    }

    /// Creates a schema mismatch error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(truncate_detail(&message.into()))
    }

    /// Creates a signing error.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::SigningFailure(message.into())
    }

    /// Returns true if the venue reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RemoteRejected { status: 404, .. })
    }

    /// Returns true if a later retry could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::RemoteRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Caps remote error text at [`ERROR_DETAIL_LIMIT`] characters.
#[must_use]
pub fn truncate_detail(text: &str) -> String {
    text.chars().take(ERROR_DETAIL_LIMIT).collect()
}
