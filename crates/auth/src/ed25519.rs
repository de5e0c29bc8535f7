//! Ed25519 request signing.
//!
//! Message: key id + timestamp (seconds) + path?query + method + body.
//! Ed25519 signatures are deterministic, so identical descriptors produce
//! identical headers.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer as _, SigningKey};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{Result, SigningError};
use crate::headers::SignedHeaders;
use crate::request::RequestDescriptor;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
pub const SIGNATURE_HEADER: &str = "x-signature";

const SEED_LEN: usize = 32;

pub struct Ed25519Signer {
    key_id: String,
    signing_key: SigningKey,
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("key_id", &self.key_id)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl Ed25519Signer {
    /// Builds a signer from a base64 key. Both the bare 32-byte seed and the
    /// 64-byte seed-plus-public-key encoding are accepted.
    ///
    /// # Errors
    /// Returns [`SigningError::KeyInvalid`] for bad base64 or an unexpected length.
    pub fn new(key_id: impl Into<String>, private_key_b64: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            BASE64
                .decode(private_key_b64.trim())
                .map_err(|e| SigningError::key_invalid(format!("Ed25519 key is not base64: {e}")))?,
        );
        if bytes.len() != SEED_LEN && bytes.len() != SEED_LEN * 2 {
            return Err(SigningError::key_invalid(format!(
                "Ed25519 key must be 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        seed.copy_from_slice(&bytes[..SEED_LEN]);

        Ok(Self {
            key_id: key_id.into(),
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    #[must_use]
    pub fn message(&self, descriptor: &RequestDescriptor) -> String {
        format!(
            "{}{}{}{}{}",
            self.key_id,
            descriptor.timestamp_secs(),
            descriptor.path_and_query(),
            descriptor.method.as_str(),
            descriptor.body
        )
    }

    pub fn sign(&self, descriptor: &RequestDescriptor) -> Result<SignedHeaders> {
        let signature = self.signing_key.sign(self.message(descriptor).as_bytes());

        Ok(SignedHeaders::new()
            .with(API_KEY_HEADER, self.key_id.clone())
            .with(TIMESTAMP_HEADER, descriptor.timestamp_secs().to_string())
            .with(SIGNATURE_HEADER, BASE64.encode(signature.to_bytes())))
    }
}
