//! ES256 bearer tokens for per-request authentication.
//!
//! Each request gets its own short-lived token whose `uri` claim binds it to
//! one method, host, and path. The header carries the key id and a random
//! nonce, which is why the token is assembled here and only the signature is
//! delegated to `jsonwebtoken`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{Algorithm, EncodingKey};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use p256::SecretKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{Result, SigningError};
use crate::headers::SignedHeaders;
use crate::request::RequestDescriptor;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const ISSUER: &str = "coinbase-cloud";
pub const AUDIENCE: &str = "cdp_service";
/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct TokenHeader<'a> {
    alg: &'static str,
    kid: &'a str,
    nonce: String,
    typ: &'static str,
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: Vec<String>,
    pub nbf: u64,
    pub exp: u64,
    pub uri: String,
}

pub struct JwtSigner {
    key_id: String,
    encoding_key: EncodingKey,
}

impl fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSigner")
            .field("key_id", &self.key_id)
            .field("encoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtSigner {
    /// Accepts a P-256 private key as SEC1 (`EC PRIVATE KEY`) or PKCS#8 PEM.
    ///
    /// # Errors
    /// Returns [`SigningError::KeyInvalid`] if the key is not a P-256 key.
    pub fn new(key_id: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        Ok(Self {
            key_id: key_id.into(),
            encoding_key: encoding_key(private_key_pem)?,
        })
    }

    /// Claims for a request; `nbf` is the request timestamp in seconds.
    ///
    /// # Errors
    /// Returns [`SigningError::Encoding`] if the descriptor has no host.
    pub fn claims(&self, descriptor: &RequestDescriptor) -> Result<Claims> {
        if descriptor.host.is_empty() {
            return Err(SigningError::encoding("token uri requires a request host"));
        }
        let now = descriptor.timestamp_secs();
        Ok(Claims {
            sub: self.key_id.clone(),
            iss: ISSUER.to_string(),
            aud: vec![AUDIENCE.to_string()],
            nbf: now,
            exp: now + TOKEN_TTL_SECS,
            uri: format!(
                "{} {}{}",
                descriptor.method.as_str(),
                descriptor.host,
                descriptor.path
            ),
        })
    }

    /// Builds a signed token for one request.
    pub fn token(&self, descriptor: &RequestDescriptor) -> Result<String> {
        let header = TokenHeader {
            alg: "ES256",
            kid: &self.key_id,
            nonce: hex::encode(rand::random::<[u8; 32]>()),
            typ: "JWT",
        };
        let claims = self.claims(descriptor)?;

        let header_json = serde_json::to_vec(&header)
            .map_err(|e| SigningError::encoding(format!("token header: {e}")))?;
        let claims_json = serde_json::to_vec(&claims)
            .map_err(|e| SigningError::encoding(format!("token claims: {e}")))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let signature = jsonwebtoken::crypto::sign(
            signing_input.as_bytes(),
            &self.encoding_key,
            Algorithm::ES256,
        )
        .map_err(|e| SigningError::encoding(format!("ES256 signing failed: {e}")))?;

        Ok(format!("{signing_input}.{signature}"))
    }

    pub fn sign(&self, descriptor: &RequestDescriptor) -> Result<SignedHeaders> {
        let token = self.token(descriptor)?;
        Ok(SignedHeaders::new().with(AUTHORIZATION_HEADER, format!("Bearer {token}")))
    }
}

fn encoding_key(pem: &str) -> Result<EncodingKey> {
    let pkcs8_pem = if pem.contains("BEGIN EC PRIVATE KEY") {
        SecretKey::from_sec1_pem(pem)
            .map_err(|e| SigningError::key_invalid(format!("failed to parse SEC1 EC key: {e}")))?
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| SigningError::key_invalid(format!("failed to convert EC key: {e}")))?
    } else {
        Zeroizing::new(pem.to_string())
    };

    SecretKey::from_pkcs8_pem(&pkcs8_pem)
        .map_err(|e| SigningError::key_invalid(format!("failed to parse P-256 key: {e}")))?;

    EncodingKey::from_ec_pem(pkcs8_pem.as_bytes())
        .map_err(|e| SigningError::key_invalid(format!("failed to load EC key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
    use p256::pkcs8::EncodePublicKey;

    const SEC1_PEM: &str = include_str!("../tests/fixtures/ec_sec1.pem");
    const PKCS8_PEM: &str = include_str!("../tests/fixtures/ec_pkcs8.pem");

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::get("/api/v3/brokerage/accounts").with_host("api.coinbase.com")
    }

    fn decoding_key(private_pem: &str) -> DecodingKey {
        let public_pem = SecretKey::from_pkcs8_pem(private_pem)
            .unwrap()
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        DecodingKey::from_ec_pem(public_pem.as_bytes()).unwrap()
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::ES256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_issuer(&[ISSUER]);
        validation
    }

    #[test]
    fn token_verifies_and_carries_claims() {
        let signer = JwtSigner::new("organizations/o/apiKeys/k", PKCS8_PEM).unwrap();
        let d = descriptor();
        let token = signer.token(&d).unwrap();

        let data = decode::<Claims>(&token, &decoding_key(PKCS8_PEM), &validation()).unwrap();
        assert_eq!(data.claims.sub, "organizations/o/apiKeys/k");
        assert_eq!(data.claims.uri, "GET api.coinbase.com/api/v3/brokerage/accounts");
        assert_eq!(data.claims.exp - data.claims.nbf, TOKEN_TTL_SECS);
        assert_eq!(data.claims.nbf, d.timestamp_secs());

        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
        assert_eq!(header.kid.as_deref(), Some("organizations/o/apiKeys/k"));
    }

    #[test]
    fn sec1_key_is_accepted() {
        let signer = JwtSigner::new("k", SEC1_PEM).unwrap();
        let token = signer.token(&descriptor()).unwrap();
        // Both fixtures hold the same key.
        assert!(decode::<Claims>(&token, &decoding_key(PKCS8_PEM), &validation()).is_ok());
    }

    #[test]
    fn header_has_fresh_nonce() {
        let signer = JwtSigner::new("k", PKCS8_PEM).unwrap();
        let nonce = |token: &str| {
            let header = token.split('.').next().unwrap();
            let json: serde_json::Value =
                serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header).unwrap()).unwrap();
            json["nonce"].as_str().unwrap().to_string()
        };
        let a = nonce(&signer.token(&descriptor()).unwrap());
        let b = nonce(&signer.token(&descriptor()).unwrap());
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn bearer_header() {
        let signer = JwtSigner::new("k", PKCS8_PEM).unwrap();
        let headers = signer.sign(&descriptor()).unwrap();
        assert!(headers.get(AUTHORIZATION_HEADER).unwrap().starts_with("Bearer ey"));
    }

    #[test]
    fn missing_host_is_encoding_error() {
        let signer = JwtSigner::new("k", PKCS8_PEM).unwrap();
        let err = signer.token(&RequestDescriptor::get("/api/v3/brokerage/accounts")).unwrap_err();
        assert!(matches!(err, SigningError::Encoding(_)));
    }

    #[test]
    fn non_ec_key_is_rejected() {
        let rsa_pem = include_str!("../tests/fixtures/rsa_pkcs8.pem");
        assert!(matches!(
            JwtSigner::new("k", rsa_pem),
            Err(SigningError::KeyInvalid(_))
        ));
        assert!(matches!(
            JwtSigner::new("k", "garbage"),
            Err(SigningError::KeyInvalid(_))
        ));
    }
}
