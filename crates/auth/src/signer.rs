use crate::credential::{Credential, SigningScheme};
use crate::ed25519::Ed25519Signer;
use crate::error::Result;
use crate::headers::SignedHeaders;
use crate::hmac::HmacSigner;
use crate::jwt::JwtSigner;
use crate::request::RequestDescriptor;
use crate::rsa_pss::RsaPssSigner;

/// Parsed key material, tagged by scheme.
#[derive(Debug)]
enum SigningKey {
    RsaPss(RsaPssSigner),
    Ed25519(Ed25519Signer),
    HmacSha256(HmacSigner),
    Es256Jwt(JwtSigner),
}

/// Signs requests for one credential.
///
/// Key material is parsed once at construction; a signer whose construction
/// succeeded only fails later on encoding problems.
#[derive(Debug)]
pub struct Signer {
    scheme: SigningScheme,
    key: SigningKey,
}

impl Signer {
    /// # Errors
    /// Returns [`SigningError::KeyInvalid`](crate::SigningError::KeyInvalid)
    /// if the secret does not parse for the credential's scheme.
    pub fn new(credential: &Credential) -> Result<Self> {
        let key_id = credential.key_id();
        let secret = credential.secret();
        let key = match credential.scheme() {
            SigningScheme::RsaPss => SigningKey::RsaPss(RsaPssSigner::new(key_id, secret)?),
            SigningScheme::Ed25519 => SigningKey::Ed25519(Ed25519Signer::new(key_id, secret)?),
            SigningScheme::HmacSha256 => SigningKey::HmacSha256(HmacSigner::new(key_id, secret)?),
            SigningScheme::Es256Jwt => SigningKey::Es256Jwt(JwtSigner::new(key_id, secret)?),
        };
        Ok(Self {
            scheme: credential.scheme(),
            key,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> SigningScheme {
        self.scheme
    }

    /// Produces the header set for `descriptor`, including
    /// `Content-Type: application/json`.
    pub fn sign(&self, descriptor: &RequestDescriptor) -> Result<SignedHeaders> {
        match &self.key {
            SigningKey::RsaPss(s) => s.sign(descriptor),
            SigningKey::Ed25519(s) => s.sign(descriptor),
            SigningKey::HmacSha256(s) => s.sign(descriptor),
            SigningKey::Es256Jwt(s) => s.sign(descriptor),
        }
    }
}

/// Signs a single request, parsing the credential's key on every call.
///
/// Adapters that sign repeatedly should hold a [`Signer`] instead.
pub fn sign(credential: &Credential, descriptor: &RequestDescriptor) -> Result<SignedHeaders> {
    Signer::new(credential)?.sign(descriptor)
}
