//! RSA-PSS (SHA-256) request signing.
//!
//! The signature is computed over: timestamp + method + path + body, with the
//! timestamp in milliseconds and the path including the API prefix but not the
//! query string. Signatures are randomized; two signatures over the same
//! message differ but both verify.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::BlindedSigningKey;
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use std::fmt;

use crate::error::{Result, SigningError};
use crate::headers::SignedHeaders;
use crate::request::RequestDescriptor;

pub const ACCESS_KEY_HEADER: &str = "KALSHI-ACCESS-KEY";
pub const TIMESTAMP_HEADER: &str = "KALSHI-ACCESS-TIMESTAMP";
pub const SIGNATURE_HEADER: &str = "KALSHI-ACCESS-SIGNATURE";

pub struct RsaPssSigner {
    key_id: String,
    signing_key: BlindedSigningKey<Sha256>,
}

impl fmt::Debug for RsaPssSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPssSigner")
            .field("key_id", &self.key_id)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl RsaPssSigner {
    /// Parses a PKCS#8 or PKCS#1 PEM private key.
    ///
    /// # Errors
    /// Returns [`SigningError::KeyInvalid`] if neither encoding parses.
    pub fn new(key_id: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        let private_key = parse_private_key(private_key_pem)?;
        Ok(Self {
            key_id: key_id.into(),
            signing_key: BlindedSigningKey::<Sha256>::new(private_key),
        })
    }

    /// Signing input for a request.
    #[must_use]
    pub fn message(descriptor: &RequestDescriptor) -> String {
        format!(
            "{}{}{}{}",
            descriptor.timestamp_ms,
            descriptor.method.as_str(),
            descriptor.path,
            descriptor.body
        )
    }

    /// Signs a request and returns the required headers.
    ///
    /// # Errors
    /// Returns [`SigningError::Encoding`] if the signature cannot be produced.
    pub fn sign(&self, descriptor: &RequestDescriptor) -> Result<SignedHeaders> {
        let message = Self::message(descriptor);
        let signature = self
            .signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), message.as_bytes())
            .map_err(|e| SigningError::encoding(format!("RSA-PSS signing failed: {e}")))?;

        Ok(SignedHeaders::new()
            .with(ACCESS_KEY_HEADER, self.key_id.clone())
            .with(TIMESTAMP_HEADER, descriptor.timestamp_ms.to_string())
            .with(SIGNATURE_HEADER, BASE64.encode(signature.to_bytes())))
    }
}

fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| SigningError::key_invalid(format!("failed to parse RSA private key: {e}")))
}
