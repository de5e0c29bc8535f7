//! Crypto brokerage, signed with Ed25519.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tradedesk_auth::Credential;
use tradedesk_core::{Balance, Holding, HttpConfig, Venue, VenueAdapter, VenueError, VenueUrls};

use crate::http::{AuthStatus, CallKind, SignedHttp};
use crate::normalize::decimal_from_value;

const ACCOUNTS_PATH: &str = "/api/v1/crypto/trading/accounts/";
const HOLDINGS_PATH: &str = "/api/v1/crypto/trading/holdings/";

#[derive(Debug, Deserialize)]
struct RawAccount {
    buying_power: Option<Value>,
    buying_power_currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHoldings {
    results: Option<Vec<RawHolding>>,
}

#[derive(Debug, Deserialize)]
struct RawHolding {
    asset_code: Option<String>,
    total_quantity: Option<Value>,
}

#[derive(Debug)]
pub struct RobinhoodAdapter {
    http: SignedHttp,
    auth: AuthStatus,
}

impl RobinhoodAdapter {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        urls: &VenueUrls,
        http: &HttpConfig,
        credential: Option<&Credential>,
    ) -> Result<Self, VenueError> {
        let (http, auth) =
            SignedHttp::new(&urls.robinhood_base_url, http)?.with_credential(credential);
        Ok(Self { http, auth })
    }

    async fn fetch_balance(&self) -> Result<Balance, VenueError> {
        let raw: RawAccount = self
            .http
            .get_json(CallKind::Account, ACCOUNTS_PATH, None)
            .await?;
        let amount = raw
            .buying_power
            .as_ref()
            .and_then(decimal_from_value)
            .ok_or_else(|| VenueError::schema("buying_power missing or not a decimal"))?;
        let currency = raw
            .buying_power_currency
            .unwrap_or_else(|| "USD".to_string());
        Ok(Balance::ok(Venue::Robinhood, amount, currency).with_note("buying power"))
    }
}

#[async_trait]
impl VenueAdapter for RobinhoodAdapter {
    fn venue(&self) -> Venue {
        Venue::Robinhood
    }

    fn is_configured(&self) -> bool {
        self.auth.is_configured()
    }

    async fn get_balance(&self) -> Balance {
        if let Some(balance) = self.auth.short_circuit(Venue::Robinhood) {
            return balance;
        }
        self.fetch_balance().await.unwrap_or_else(|e| {
            tracing::warn!(venue = %Venue::Robinhood, error = %e, "balance lookup failed");
            Balance::error(Venue::Robinhood, e)
        })
    }

    async fn get_holdings(&self) -> Result<Vec<Holding>, VenueError> {
        if !self.auth.require()? {
            return Ok(Vec::new());
        }
        let raw: RawHoldings = self
            .http
            .get_json(CallKind::Account, HOLDINGS_PATH, None)
            .await?;

        Ok(raw
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|h| Holding {
                venue: Venue::Robinhood,
                asset: h.asset_code.unwrap_or_else(|| "?".to_string()),
                quantity: h
                    .total_quantity
                    .as_ref()
                    .and_then(decimal_from_value)
                    .unwrap_or(Decimal::ZERO),
                usd_value: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use tradedesk_auth::SigningScheme;
    use tradedesk_core::BalanceStatus;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEED: &str = include_str!("../../auth/tests/fixtures/ed25519_seed.b64");

    fn adapter(server: &MockServer, credential: Option<&Credential>) -> RobinhoodAdapter {
        let urls = VenueUrls {
            robinhood_base_url: server.uri(),
            ..VenueUrls::default()
        };
        RobinhoodAdapter::new(&urls, &HttpConfig::default(), credential).unwrap()
    }

    fn credential() -> Credential {
        Credential::new("rh-api-key", SEED.trim(), SigningScheme::Ed25519)
    }

    #[tokio::test]
    async fn buying_power_balance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCOUNTS_PATH))
            .and(header("x-api-key", "rh-api-key"))
            .and(header_exists("x-timestamp"))
            .and(header_exists("x-signature"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account_number": "1",
                "buying_power": "250.75",
                "buying_power_currency": "USD"
            })))
            .mount(&server)
            .await;

        let balance = adapter(&server, Some(&credential())).get_balance().await;
        assert_eq!(balance.amount(), Some(dec!(250.75)));
        assert!(matches!(
            balance.status,
            BalanceStatus::Ok { note: Some(ref n), .. } if n == "buying power"
        ));
    }

    #[tokio::test]
    async fn currency_defaults_to_usd() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCOUNTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"buying_power": 10})))
            .mount(&server)
            .await;

        let balance = adapter(&server, Some(&credential())).get_balance().await;
        assert!(matches!(
            balance.status,
            BalanceStatus::Ok { ref currency, amount, .. } if currency == "USD" && amount == dec!(10)
        ));
    }

    #[tokio::test]
    async fn holdings_listed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HOLDINGS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"asset_code": "BTC", "total_quantity": "0.015"},
                    {"asset_code": "ETH", "total_quantity": 1.5}
                ]
            })))
            .mount(&server)
            .await;

        let holdings = adapter(&server, Some(&credential())).get_holdings().await.unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].asset, "BTC");
        assert_eq!(holdings[0].quantity, dec!(0.015));
        assert_eq!(holdings[1].quantity, dec!(1.5));
    }

    #[tokio::test]
    async fn unconfigured_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let rh = adapter(&server, None);
        assert!(matches!(rh.get_balance().await.status, BalanceStatus::Unconfigured));
        assert!(rh.get_holdings().await.unwrap().is_empty());
        assert!(rh.get_markets(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forbidden_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ACCOUNTS_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("{\"detail\":\"bad signature\"}"))
            .mount(&server)
            .await;

        let balance = adapter(&server, Some(&credential())).get_balance().await;
        assert!(matches!(
            balance.status,
            BalanceStatus::Error(VenueError::RemoteRejected { status: 403, .. })
        ));
    }
}
