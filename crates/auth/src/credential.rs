use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Authentication scheme a venue expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningScheme {
    /// RSA-PSS over SHA-256, millisecond timestamps.
    RsaPss,
    /// Ed25519 over a key-prefixed message, second timestamps.
    Ed25519,
    /// HMAC-SHA256 with a request expiry.
    HmacSha256,
    /// Short-lived ES256 bearer token.
    Es256Jwt,
}

impl SigningScheme {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RsaPss => "rsa-pss",
            Self::Ed25519 => "ed25519",
            Self::HmacSha256 => "hmac-sha256",
            Self::Es256Jwt => "es256-jwt",
        }
    }
}

/// Key id plus secret material for one venue.
///
/// The secret is a PEM document, a base64 seed, or a shared secret depending
/// on the scheme.
pub struct Credential {
    key_id: String,
    secret: SecretString,
    scheme: SigningScheme,
}

impl Credential {
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>, scheme: SigningScheme) -> Self {
        Self {
            key_id: key_id.into(),
            secret: SecretString::from(secret.into()),
            scheme,
        }
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[must_use]
    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    pub(crate) fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key_id", &self.key_id)
            .field("secret", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.key_id.zeroize();
    }
}

/// Expands literal `\n` sequences, as found in PEM values stored in
/// single-line environment variables.
#[must_use]
pub fn expand_escaped_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}
