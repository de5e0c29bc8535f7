//! Derivatives exchange, signed with HMAC-SHA256.
//!
//! The balance lives under a different path depending on account type, and
//! has been reported in two encodings: `*Rv` fields hold plain decimals, `*Ev`
//! fields hold integers scaled by 1e8.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use tradedesk_auth::Credential;
use tradedesk_core::{Balance, HttpConfig, Venue, VenueAdapter, VenueError, VenueUrls};

use crate::fallback::{first_parse, first_success, ParseStrategy};
use crate::http::{AuthStatus, CallKind, SignedHttp};
use crate::normalize::{decimal_from_value, scale_integer};

/// Balance endpoints, most specific first.
const BALANCE_ENDPOINTS: [&str; 4] = [
    "/g-accounts/accountPositions",
    "/accounts/accountPositions",
    "/accounts/positions",
    "/spot/wallets",
];
const BALANCE_QUERY: &str = "currency=USDT";
const EV_DECIMALS: u32 = 8;

/// Reads a `*Ev` field: an integer scaled by 1e8.
fn scaled_ev(value: &Value) -> Option<Decimal> {
    match value.as_i64() {
        Some(raw) => Some(scale_integer(raw, EV_DECIMALS)),
        None => decimal_from_value(value).map(|d| d / Decimal::from(100_000_000u64)),
    }
}

/// `{"data": {"account": {...}}}` from the account-positions endpoints.
fn account_object(value: &Value) -> Option<Decimal> {
    let account = value.get("data")?.get("account")?;
    ["totalBalanceRv", "accountBalanceRv"]
        .iter()
        .find_map(|key| account.get(*key).and_then(decimal_from_value))
        .or_else(|| account.get("accountBalanceEv").and_then(scaled_ev))
}

/// `{"data": [{"currency": "USDT", ...}]}` from the wallet endpoint.
fn wallet_array(value: &Value) -> Option<Decimal> {
    let wallet = value
        .get("data")?
        .as_array()?
        .iter()
        .find(|w| w.get("currency").and_then(Value::as_str) == Some("USDT"))?;
    wallet
        .get("balanceRv")
        .and_then(decimal_from_value)
        .or_else(|| wallet.get("balanceEv").and_then(scaled_ev))
}

const BALANCE_SHAPES: [ParseStrategy<Decimal>; 2] = [account_object, wallet_array];

#[derive(Debug)]
pub struct PhemexAdapter {
    http: SignedHttp,
    auth: AuthStatus,
}

impl PhemexAdapter {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        urls: &VenueUrls,
        http: &HttpConfig,
        credential: Option<&Credential>,
    ) -> Result<Self, VenueError> {
        let (http, auth) =
            SignedHttp::new(&urls.phemex_base_url, http)?.with_credential(credential);
        Ok(Self { http, auth })
    }

    async fn fetch_from(&self, endpoint: &str) -> Result<Decimal, VenueError> {
        let raw: Value = self
            .http
            .get_json(CallKind::Account, endpoint, Some(BALANCE_QUERY))
            .await?;

        let code = raw.get("code").and_then(Value::as_i64);
        if code != Some(0) {
            let msg = raw.get("msg").and_then(Value::as_str).unwrap_or("");
            return Err(VenueError::schema(format!(
                "unexpected response code {code:?}: {msg}"
            )));
        }
        first_parse(&raw, &BALANCE_SHAPES)
            .ok_or_else(|| VenueError::schema("no recognized balance field"))
    }

    async fn fetch_balance(&self) -> Result<Balance, VenueError> {
        let amount = first_success(&BALANCE_ENDPOINTS, |endpoint| self.fetch_from(endpoint)).await?;
        Ok(Balance::ok(Venue::Phemex, amount, "USDT"))
    }
}

#[async_trait]
impl VenueAdapter for PhemexAdapter {
    fn venue(&self) -> Venue {
        Venue::Phemex
    }

    fn is_configured(&self) -> bool {
        self.auth.is_configured()
    }

    async fn get_balance(&self) -> Balance {
        if let Some(balance) = self.auth.short_circuit(Venue::Phemex) {
            return balance;
        }
        self.fetch_balance().await.unwrap_or_else(|e| {
            tracing::warn!(venue = %Venue::Phemex, error = %e, "balance lookup failed");
            Balance::error(Venue::Phemex, e)
        })
    }
}
