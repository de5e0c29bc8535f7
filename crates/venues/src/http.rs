//! Rate-limited, optionally signed JSON transport shared by every adapter.

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tradedesk_auth::{Credential, Method, RequestDescriptor, Signer};
use tradedesk_core::{Balance, HttpConfig, Venue, VenueError};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// How an adapter's credential turned out at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// No credential was supplied; no request will be attempted.
    Unconfigured,
    Ready,
    /// The credential's key material did not parse.
    Invalid(VenueError),
}

impl AuthStatus {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::Unconfigured)
    }

    /// Balance to report without touching the network, if any.
    #[must_use]
    pub fn short_circuit(&self, venue: Venue) -> Option<Balance> {
        match self {
            Self::Unconfigured => Some(Balance::unconfigured(venue)),
            Self::Invalid(e) => Some(Balance::error(venue, e.clone())),
            Self::Ready => None,
        }
    }

    /// `Ok(true)` if requests may be sent, `Ok(false)` if the venue is
    /// unconfigured.
    ///
    /// # Errors
    /// Returns the signing failure recorded for an invalid credential.
    pub fn require(&self) -> Result<bool, VenueError> {
        match self {
            Self::Unconfigured => Ok(false),
            Self::Invalid(e) => Err(e.clone()),
            Self::Ready => Ok(true),
        }
    }
}

/// Which timeout budget a call runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Balance and holdings lookups.
    Account,
    /// Market and event listings.
    Listing,
}

/// HTTP client bound to one base URL.
///
/// Builds a [`RequestDescriptor`] per call, signs it when a signer is present,
/// and maps every failure onto [`VenueError`]: network errors and timeouts to
/// `Transport`, non-2xx to `RemoteRejected` with a truncated body, and
/// undecodable 2xx bodies to `SchemaMismatch`.
pub struct SignedHttp {
    base_url: String,
    host: String,
    api_prefix: String,
    http: Client,
    rate_limiter: Arc<DirectRateLimiter>,
    signer: Option<Signer>,
    account_timeout: Duration,
    listing_timeout: Duration,
}

impl std::fmt::Debug for SignedHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedHttp")
            .field("base_url", &self.base_url)
            .field("api_prefix", &self.api_prefix)
            .field("signed", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl SignedHttp {
    /// # Errors
    /// Returns [`VenueError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, config: &HttpConfig) -> Result<Self, VenueError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let account_timeout = Duration::from_secs(config.balance_timeout_secs);
        let listing_timeout = Duration::from_secs(config.market_timeout_secs);

        let http = Client::builder()
            .timeout(account_timeout.max(listing_timeout))
            .build()
            .map_err(|e| VenueError::transport(format!("failed to build HTTP client: {e}")))?;

        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(nonzero!(60u32));
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            host: host_of(&base_url),
            base_url,
            api_prefix: String::new(),
            http,
            rate_limiter,
            signer: None,
            account_timeout,
            listing_timeout,
        })
    }

    #[must_use]
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Parses `credential` and attaches the resulting signer.
    #[must_use]
    pub fn with_credential(self, credential: Option<&Credential>) -> (Self, AuthStatus) {
        let Some(credential) = credential else {
            return (self, AuthStatus::Unconfigured);
        };
        match Signer::new(credential) {
            Ok(signer) => (self.with_signer(signer), AuthStatus::Ready),
            Err(e) => {
                tracing::warn!(scheme = credential.scheme().name(), error = %e, "credential rejected");
                (self, AuthStatus::Invalid(VenueError::signing(e.to_string())))
            }
        }
    }

    /// Path prefix prepended to every request path, and included in the
    /// signed path.
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Overrides the host used in signed token claims.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        kind: CallKind,
        path: &str,
        query: Option<&str>,
    ) -> Result<T, VenueError> {
        let mut descriptor = RequestDescriptor::get(format!("{}{}", self.api_prefix, path));
        if let Some(query) = query {
            descriptor = descriptor.with_query(query);
        }
        self.execute(kind, descriptor).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        kind: CallKind,
        path: &str,
        body: &B,
    ) -> Result<T, VenueError> {
        let body = serde_json::to_string(body)
            .map_err(|e| VenueError::schema(format!("failed to encode request body: {e}")))?;
        let descriptor = RequestDescriptor::post(format!("{}{}", self.api_prefix, path), body);
        self.execute(kind, descriptor).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        kind: CallKind,
        descriptor: RequestDescriptor,
    ) -> Result<T, VenueError> {
        self.rate_limiter.until_ready().await;

        let descriptor = descriptor.with_host(self.host.clone());
        let url = format!("{}{}", self.base_url, descriptor.path_and_query());

        let mut request = match descriptor.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url).body(descriptor.body.clone()),
        }
        .timeout(match kind {
            CallKind::Account => self.account_timeout,
            CallKind::Listing => self.listing_timeout,
        })
        .header("Accept", "application/json");

        if let Some(signer) = &self.signer {
            let headers = signer
                .sign(&descriptor)
                .map_err(|e| VenueError::signing(e.to_string()))?;
            for (name, value) in headers.as_tuples() {
                request = request.header(name, value);
            }
        } else {
            request = request.header("Content-Type", "application/json");
        }

        tracing::debug!(method = %descriptor.method, url = %url, "venue request");

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(VenueError::rejected(status.as_u16(), &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| VenueError::schema(format!("failed to decode response: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> VenueError {
    if e.is_timeout() {
        VenueError::transport(format!("request timed out: {e}"))
    } else {
        VenueError::transport(e.to_string())
    }
}

/// Host portion of a URL, without scheme or path.
fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tradedesk_auth::{Credential, SigningScheme};
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> HttpConfig {
        HttpConfig {
            balance_timeout_secs: 2,
            market_timeout_secs: 2,
            requests_per_minute: 600,
        }
    }

    #[test]
    fn host_extraction() {
        assert_eq!(host_of("https://api.coinbase.com"), "api.coinbase.com");
        assert_eq!(host_of("http://127.0.0.1:8080/x"), "127.0.0.1:8080");
        assert_eq!(host_of("localhost"), "localhost");
    }

    #[test]
    fn credential_outcomes() {
        let (_, status) = SignedHttp::new("http://localhost", &config())
            .unwrap()
            .with_credential(None);
        assert_eq!(status, AuthStatus::Unconfigured);
        assert!(status.short_circuit(Venue::Kalshi).is_some());
        assert_eq!(status.require(), Ok(false));

        let bad = Credential::new("k", "not a key", SigningScheme::RsaPss);
        let (_, status) = SignedHttp::new("http://localhost", &config())
            .unwrap()
            .with_credential(Some(&bad));
        assert!(matches!(status, AuthStatus::Invalid(VenueError::SigningFailure(_))));
        assert!(status.is_configured());
        assert!(status.require().is_err());

        let good = Credential::new("k", "secret", SigningScheme::HmacSha256);
        let (http, status) = SignedHttp::new("http://localhost", &config())
            .unwrap()
            .with_credential(Some(&good));
        assert_eq!(status, AuthStatus::Ready);
        assert!(status.short_circuit(Venue::Phemex).is_none());
        assert!(http.signer.is_some());
    }

    #[tokio::test]
    async fn unsigned_get_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/markets"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let http = SignedHttp::new(server.uri(), &config()).unwrap();
        let body: Value = http
            .get_json(CallKind::Listing, "/markets", Some("limit=5"))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn prefix_is_part_of_url_and_signature() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trade-api/v2/portfolio/balance"))
            .and(header_exists("KALSHI-ACCESS-SIGNATURE"))
            .and(header("KALSHI-ACCESS-KEY", "key-1"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 1})))
            .mount(&server)
            .await;

        let credential = Credential::new(
            "key-1",
            include_str!("../../auth/tests/fixtures/rsa_pkcs8.pem"),
            SigningScheme::RsaPss,
        );
        let http = SignedHttp::new(server.uri(), &config())
            .unwrap()
            .with_api_prefix("/trade-api/v2")
            .with_signer(Signer::new(&credential).unwrap());
        let body: Value = http
            .get_json(CallKind::Account, "/portfolio/balance", None)
            .await
            .unwrap();
        assert_eq!(body["balance"], 1);
    }

    #[tokio::test]
    async fn post_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_json(json!({"id": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "0x1"})))
            .mount(&server)
            .await;

        let http = SignedHttp::new(server.uri(), &config()).unwrap();
        let body: Value = http
            .post_json(CallKind::Account, "/", &json!({"id": 1}))
            .await
            .unwrap();
        assert_eq!(body["result"], "0x1");
    }

    #[tokio::test]
    async fn non_success_is_rejected_with_truncated_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("y".repeat(400)))
            .mount(&server)
            .await;

        let http = SignedHttp::new(server.uri(), &config()).unwrap();
        let err = http
            .get_json::<Value>(CallKind::Account, "/x", None)
            .await
            .unwrap_err();
        match err {
            VenueError::RemoteRejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body.len(), 120);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_json_is_schema_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let http = SignedHttp::new(server.uri(), &config()).unwrap();
        let err = http
            .get_json::<Value>(CallKind::Account, "/x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::SchemaMismatch(_)));
    }

    #[tokio::test]
    async fn slow_response_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = HttpConfig {
            balance_timeout_secs: 1,
            market_timeout_secs: 1,
            requests_per_minute: 600,
        };
        let http = SignedHttp::new(server.uri(), &config).unwrap();
        let err = http
            .get_json::<Value>(CallKind::Account, "/x", None)
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, VenueError::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let http = SignedHttp::new("http://127.0.0.1:9", &config()).unwrap();
        let err = http
            .get_json::<Value>(CallKind::Account, "/x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::Transport(_)));
    }
}
