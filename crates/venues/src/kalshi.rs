//! Regulated event-contract exchange.
//!
//! Requests are signed with RSA-PSS over the full `/trade-api/v2` path.
//! Balances arrive as integer cents; market prices as cents or as
//! `*_dollars` decimal strings.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tradedesk_auth::Credential;
use tradedesk_core::{
    Balance, HttpConfig, NormalizedMarket, ScanConfig, Venue, VenueAdapter, VenueError, VenueUrls,
};

use crate::http::{AuthStatus, CallKind, SignedHttp};
use crate::normalize::{decode_entries, normalize_kalshi, scale_integer, RawKalshiMarket};

#[derive(Debug, Deserialize)]
struct RawBalanceResponse {
    balance: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawEventsResponse {
    events: Option<Vec<RawEvent>>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_ticker: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMarketsResponse {
    markets: Option<Vec<Value>>,
}

#[derive(Debug)]
pub struct KalshiAdapter {
    http: SignedHttp,
    auth: AuthStatus,
    event_limit: usize,
    events_scanned: usize,
}

impl KalshiAdapter {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        urls: &VenueUrls,
        http: &HttpConfig,
        scan: &ScanConfig,
        credential: Option<&Credential>,
    ) -> Result<Self, VenueError> {
        let (http, auth) = SignedHttp::new(&urls.kalshi_base_url, http)?
            .with_api_prefix(&urls.kalshi_api_prefix)
            .with_credential(credential);
        Ok(Self {
            http,
            auth,
            event_limit: scan.event_limit,
            events_scanned: scan.events_scanned,
        })
    }

    async fn fetch_balance(&self) -> Result<Balance, VenueError> {
        let raw: RawBalanceResponse = self
            .http
            .get_json(CallKind::Account, "/portfolio/balance", None)
            .await?;
        let cents = raw
            .balance
            .ok_or_else(|| VenueError::schema("balance field missing"))?;
        Ok(Balance::ok(Venue::Kalshi, scale_integer(cents, 2), "USD"))
    }

    async fn fetch_event_markets(&self, event: &RawEvent) -> Result<Vec<NormalizedMarket>, VenueError> {
        let query = format!("event_ticker={}&status=open", event.event_ticker);
        let raw: RawMarketsResponse = self
            .http
            .get_json(CallKind::Listing, "/markets", Some(&query))
            .await?;
        let title = event.title.as_deref().unwrap_or(&event.event_ticker);

        let listed: Vec<RawKalshiMarket> = decode_entries(&raw.markets.unwrap_or_default());
        Ok(listed
            .iter()
            .filter_map(|m| match normalize_kalshi(m, title) {
                Ok(market) => Some(market),
                Err(reason) => {
                    tracing::trace!(ticker = ?m.ticker, ?reason, "skipping market");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl VenueAdapter for KalshiAdapter {
    fn venue(&self) -> Venue {
        Venue::Kalshi
    }

    fn is_configured(&self) -> bool {
        self.auth.is_configured()
    }

    async fn get_balance(&self) -> Balance {
        if let Some(balance) = self.auth.short_circuit(Venue::Kalshi) {
            return balance;
        }
        self.fetch_balance().await.unwrap_or_else(|e| {
            tracing::warn!(venue = %Venue::Kalshi, error = %e, "balance lookup failed");
            Balance::error(Venue::Kalshi, e)
        })
    }

    /// Lists up to `limit` open events (never more than the configured event
    /// limit), then expands the markets of the first few. A failed event is
    /// logged and skipped.
    async fn get_markets(&self, limit: usize) -> Result<Vec<NormalizedMarket>, VenueError> {
        if !self.auth.require()? {
            return Ok(Vec::new());
        }

        let query = format!("limit={}&status=open", limit.min(self.event_limit));
        let raw: RawEventsResponse = self
            .http
            .get_json(CallKind::Listing, "/events", Some(&query))
            .await?;

        let mut markets = Vec::new();
        for event in raw.events.unwrap_or_default().iter().take(self.events_scanned) {
            match self.fetch_event_markets(event).await {
                Ok(mut found) => markets.append(&mut found),
                Err(e) => {
                    tracing::warn!(event = %event.event_ticker, error = %e, "event markets fetch failed");
                }
            }
        }
        Ok(markets)
    }
}
