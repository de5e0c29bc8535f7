use thiserror::Error;

/// Errors produced while preparing or applying a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// Key material is malformed, of the wrong type, or of the wrong length.
    #[error("invalid key: {0}")]
    KeyInvalid(String),

    /// The signature or token could not be produced or encoded.
    #[error("encoding failed: {0}")]
    Encoding(String),
}

impl SigningError {
    pub fn key_invalid(message: impl Into<String>) -> Self {
        Self::KeyInvalid(message.into())
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SigningError>;
