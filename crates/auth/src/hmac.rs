//! HMAC-SHA256 request signing with a request expiry.
//!
//! Message: path + query + expiry + body, where expiry is the request
//! timestamp in seconds plus [`EXPIRY_WINDOW_SECS`]. The key is the raw UTF-8
//! secret and the signature is lower-case hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{Result, SigningError};
use crate::headers::SignedHeaders;
use crate::request::RequestDescriptor;

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_TOKEN_HEADER: &str = "x-phemex-access-token";
pub const EXPIRY_HEADER: &str = "x-phemex-request-expiry";
pub const SIGNATURE_HEADER: &str = "x-phemex-request-signature";

/// Seconds a signed request stays valid.
pub const EXPIRY_WINDOW_SECS: u64 = 60;

pub struct HmacSigner {
    key_id: String,
    secret: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("key_id", &self.key_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl HmacSigner {
    /// # Errors
    /// Returns [`SigningError::KeyInvalid`] if the secret is empty.
    pub fn new(key_id: impl Into<String>, secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(SigningError::key_invalid("HMAC secret is empty"));
        }
        Ok(Self {
            key_id: key_id.into(),
            secret: Zeroizing::new(secret.as_bytes().to_vec()),
        })
    }

    #[must_use]
    pub fn expiry(descriptor: &RequestDescriptor) -> u64 {
        descriptor.timestamp_secs() + EXPIRY_WINDOW_SECS
    }

    #[must_use]
    pub fn message(descriptor: &RequestDescriptor) -> String {
        format!(
            "{}{}{}{}",
            descriptor.path,
            descriptor.query_str(),
            Self::expiry(descriptor),
            descriptor.body
        )
    }

    pub fn sign(&self, descriptor: &RequestDescriptor) -> Result<SignedHeaders> {
        let signature = hmac_hex(&self.secret, Self::message(descriptor).as_bytes())?;

        Ok(SignedHeaders::new()
            .with(ACCESS_TOKEN_HEADER, self.key_id.clone())
            .with(EXPIRY_HEADER, Self::expiry(descriptor).to_string())
            .with(SIGNATURE_HEADER, signature))
    }
}

fn hmac_hex(key: &[u8], message: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| SigningError::key_invalid(format!("invalid HMAC key length: {e}")))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_matches_reference_vector() {
        let sig = hmac_hex(b"key", b"The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            sig,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn message_concatenates_query_without_separator() {
        let d = RequestDescriptor::get("/spot/wallets")
            .with_query("currency=USDT")
            .at(1_700_000_000_500);
        assert_eq!(HmacSigner::expiry(&d), 1_700_000_060);
        assert_eq!(
            HmacSigner::message(&d),
            "/spot/walletscurrency=USDT1700000060"
        );
    }

    #[test]
    fn signed_headers_match_known_signature() {
        let signer = HmacSigner::new("phemex-key", "phemex-secret").unwrap();
        let d = RequestDescriptor::get("/spot/wallets")
            .with_query("currency=USDT")
            .at(1_700_000_000_000);
        let headers = signer.sign(&d).unwrap();

        assert_eq!(headers.get(ACCESS_TOKEN_HEADER), Some("phemex-key"));
        assert_eq!(headers.get(EXPIRY_HEADER), Some("1700000060"));
        assert_eq!(
            headers.get(SIGNATURE_HEADER),
            Some("8f00b29427dbfc489bd55f794e7495d85223b69595ae34d413717f24ce801d94")
        );
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn signature_is_lowercase_hex() {
        let signer = HmacSigner::new("k", "s").unwrap();
        let headers = signer.sign(&RequestDescriptor::get("/accounts/positions")).unwrap();
        let sig = headers.get(SIGNATURE_HEADER).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            HmacSigner::new("k", ""),
            Err(SigningError::KeyInvalid(_))
        ));
    }
}
