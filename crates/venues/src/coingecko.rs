//! Daily price history for crypto underlyings from the public CoinGecko API.

use serde::Deserialize;
use tradedesk_core::{HttpConfig, VenueError, VenueUrls};

use crate::http::{CallKind, SignedHttp};

#[derive(Debug, Deserialize)]
struct RawMarketChart {
    /// `[timestamp_ms, price]` pairs, oldest first.
    prices: Option<Vec<(f64, f64)>>,
}

/// Unauthenticated client for coin price history.
#[derive(Debug)]
pub struct PriceHistoryClient {
    http: SignedHttp,
}

impl PriceHistoryClient {
    pub fn new(urls: &VenueUrls, http: &HttpConfig) -> Result<Self, VenueError> {
        Ok(Self {
            http: SignedHttp::new(&urls.coingecko_url, http)?,
        })
    }

    /// USD closes for the last `days` days, oldest first. Non-finite points
    /// are dropped.
    ///
    /// # Errors
    /// Transport and status failures, or a body without a price series.
    pub async fn daily_closes(&self, coin_id: &str, days: u32) -> Result<Vec<f64>, VenueError> {
        let query = format!("vs_currency=usd&days={days}&interval=daily");
        let raw: RawMarketChart = self
            .http
            .get_json(
                CallKind::Listing,
                &format!("/api/v3/coins/{coin_id}/market_chart"),
                Some(&query),
            )
            .await?;
        let prices = raw
            .prices
            .ok_or_else(|| VenueError::schema("market chart has no prices"))?;
        let closes: Vec<f64> = prices
            .into_iter()
            .map(|(_, price)| price)
            .filter(|price| price.is_finite())
            .collect();
        tracing::debug!(coin = coin_id, points = closes.len(), "price history fetched");
        Ok(closes)
    }
}
