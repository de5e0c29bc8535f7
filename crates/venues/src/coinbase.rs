//! Spot exchange (Advanced Trade API).
//!
//! Every request carries a fresh ES256 bearer token whose `uri` claim names
//! the configured API host, so the signing host is set explicitly rather than
//! derived from the base URL.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::Value;
use tradedesk_auth::Credential;
use tradedesk_core::{Balance, Holding, HttpConfig, Venue, VenueAdapter, VenueError, VenueUrls};

use crate::http::{AuthStatus, CallKind, SignedHttp};
use crate::normalize::decimal_from_value;

const ACCOUNTS_PATH: &str = "/api/v3/brokerage/accounts";
const ACCOUNTS_QUERY: &str = "limit=250";
/// Dust below this is not listed as a holding.
const HOLDING_FLOOR: Decimal = dec!(0.001);

#[derive(Debug, Deserialize)]
struct RawAccounts {
    accounts: Option<Vec<RawAccount>>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    currency: Option<String>,
    available_balance: Option<RawAmount>,
}

#[derive(Debug, Deserialize)]
struct RawAmount {
    value: Option<Value>,
}

impl RawAccount {
    fn available(&self) -> Decimal {
        self.available_balance
            .as_ref()
            .and_then(|b| b.value.as_ref())
            .and_then(decimal_from_value)
            .unwrap_or(Decimal::ZERO)
    }

    fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("?")
    }
}

#[derive(Debug)]
pub struct CoinbaseAdapter {
    http: SignedHttp,
    auth: AuthStatus,
}

impl CoinbaseAdapter {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        urls: &VenueUrls,
        http: &HttpConfig,
        credential: Option<&Credential>,
    ) -> Result<Self, VenueError> {
        let (http, auth) = SignedHttp::new(&urls.coinbase_base_url, http)?
            .with_host(&urls.coinbase_host)
            .with_credential(credential);
        Ok(Self { http, auth })
    }

    async fn fetch_accounts(&self) -> Result<Vec<RawAccount>, VenueError> {
        let raw: RawAccounts = self
            .http
            .get_json(CallKind::Account, ACCOUNTS_PATH, Some(ACCOUNTS_QUERY))
            .await?;
        raw.accounts
            .ok_or_else(|| VenueError::schema("accounts field missing"))
    }

    async fn fetch_balance(&self) -> Result<Balance, VenueError> {
        let usd: Decimal = self
            .fetch_accounts()
            .await?
            .iter()
            .filter(|a| a.currency() == "USD")
            .map(RawAccount::available)
            .sum();
        Ok(Balance::ok(Venue::Coinbase, usd, "USD"))
    }
}

#[async_trait]
impl VenueAdapter for CoinbaseAdapter {
    fn venue(&self) -> Venue {
        Venue::Coinbase
    }

    fn is_configured(&self) -> bool {
        self.auth.is_configured()
    }

    async fn get_balance(&self) -> Balance {
        if let Some(balance) = self.auth.short_circuit(Venue::Coinbase) {
            return balance;
        }
        self.fetch_balance().await.unwrap_or_else(|e| {
            tracing::warn!(venue = %Venue::Coinbase, error = %e, "balance lookup failed");
            Balance::error(Venue::Coinbase, e)
        })
    }

    async fn get_holdings(&self) -> Result<Vec<Holding>, VenueError> {
        if !self.auth.require()? {
            return Ok(Vec::new());
        }
        Ok(self
            .fetch_accounts()
            .await?
            .iter()
            .filter_map(|account| {
                let quantity = account.available();
                (quantity > HOLDING_FLOOR).then(|| {
                    let asset = account.currency().to_string();
                    Holding {
                        venue: Venue::Coinbase,
                        usd_value: (asset == "USD").then_some(quantity),
                        asset,
                        quantity,
                    }
                })
            })
            .collect())
    }
}
