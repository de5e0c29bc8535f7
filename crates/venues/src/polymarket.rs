//! Blockchain-settled prediction market.
//!
//! Nothing here is signed. The balance is the wallet's USDC held on chain,
//! read with a JSON-RPC `eth_call` against several public endpoints in turn.
//! Market listings come from the CLOB API; slug lookups and order books back
//! the liquidity scan.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tradedesk_core::{
    Balance, BookLevel, HttpConfig, NormalizedMarket, OrderBook, Venue, VenueAdapter, VenueError,
    VenueUrls,
};

use crate::fallback::{first_parse, first_success, ParseStrategy};
use crate::http::{CallKind, SignedHttp};
use crate::normalize::{
    decimal_from_value, decode_entries, normalize_polymarket, parse_hex_quantity, RawPolymarketMarket,
};

/// `balanceOf(address)` selector.
const BALANCE_OF_SELECTOR: &str = "0x70a08231";
/// USDC carries six decimals.
const USDC_DECIMALS: u32 = 6;

#[derive(Debug, Deserialize)]
struct RawRpcResponse {
    result: Option<String>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    bids: Option<Vec<RawBookLevel>>,
    asks: Option<Vec<RawBookLevel>>,
}

#[derive(Debug, Deserialize)]
struct RawBookLevel {
    price: Value,
    size: Value,
}

fn parse_levels(raw: Option<Vec<RawBookLevel>>) -> Vec<BookLevel> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(|level| {
            Some(BookLevel {
                price: decimal_from_value(&level.price)?,
                size: decimal_from_value(&level.size)?,
            })
        })
        .collect()
}

fn bare_array(value: &Value) -> Option<Vec<RawPolymarketMarket>> {
    Some(decode_entries(value.as_array()?))
}

fn data_envelope(value: &Value) -> Option<Vec<RawPolymarketMarket>> {
    bare_array(value.get("data")?)
}

/// Listing shapes: a bare array, or `{ "data": [...] }`.
const LISTING_SHAPES: [ParseStrategy<Vec<RawPolymarketMarket>>; 2] = [bare_array, data_envelope];

/// `eth_call` data for `balanceOf(wallet)`.
fn balance_of_call(wallet: &str) -> String {
    let address = wallet.trim().to_lowercase();
    let address = address.trim_start_matches("0x");
    format!("{BALANCE_OF_SELECTOR}{address:0>64}")
}

#[derive(Debug)]
pub struct PolymarketAdapter {
    clob: SignedHttp,
    gamma: SignedHttp,
    rpcs: Vec<SignedHttp>,
    wallet: Option<String>,
    usdc_contract: String,
}

impl PolymarketAdapter {
    /// # Errors
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(
        urls: &VenueUrls,
        http: &HttpConfig,
        wallet: Option<String>,
    ) -> Result<Self, VenueError> {
        let rpcs = urls
            .polygon_rpc_urls
            .iter()
            .map(|url| SignedHttp::new(url, http))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            clob: SignedHttp::new(&urls.polymarket_clob_url, http)?,
            gamma: SignedHttp::new(&urls.polymarket_gamma_url, http)?,
            rpcs,
            wallet: wallet.filter(|w| !w.trim().is_empty()),
            usdc_contract: urls.usdc_contract.clone(),
        })
    }

    async fn fetch_balance(&self, wallet: &str) -> Result<Balance, VenueError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{"to": self.usdc_contract, "data": balance_of_call(wallet)}, "latest"],
            "id": 1,
        });

        let result = first_success(&self.rpcs, |rpc| {
            let payload = &payload;
            async move {
                let raw: RawRpcResponse = rpc.post_json(CallKind::Account, "", payload).await?;
                if let Some(error) = raw.error {
                    return Err(VenueError::schema(format!("rpc error: {error}")));
                }
                raw.result
                    .ok_or_else(|| VenueError::schema("rpc response missing result"))
            }
        })
        .await?;

        let amount = parse_hex_quantity(&result, USDC_DECIMALS)?;
        Ok(Balance::ok(Venue::Polymarket, amount, "USDC"))
    }

    /// Looks up a market by its URL slug. `Ok(None)` when no market matches.
    pub async fn find_market_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<RawPolymarketMarket>, VenueError> {
        let raw: Value = self
            .gamma
            .get_json(CallKind::Account, "/markets", Some(&format!("slug={slug}")))
            .await?;
        Ok(first_parse(&raw, &LISTING_SHAPES).and_then(|markets| markets.into_iter().next()))
    }

    /// Order book for one outcome token.
    pub async fn get_order_book(&self, token_id: &str) -> Result<OrderBook, VenueError> {
        let raw: RawBook = self
            .clob
            .get_json(CallKind::Account, "/book", Some(&format!("token_id={token_id}")))
            .await?;
        Ok(OrderBook {
            bids: parse_levels(raw.bids),
            asks: parse_levels(raw.asks),
        })
    }
}

#[async_trait]
impl VenueAdapter for PolymarketAdapter {
    fn venue(&self) -> Venue {
        Venue::Polymarket
    }

    fn is_configured(&self) -> bool {
        self.wallet.is_some()
    }

    async fn get_balance(&self) -> Balance {
        let Some(wallet) = &self.wallet else {
            return Balance::unconfigured(Venue::Polymarket);
        };
        self.fetch_balance(wallet).await.unwrap_or_else(|e| {
            tracing::warn!(venue = %Venue::Polymarket, error = %e, "balance lookup failed");
            Balance::error(Venue::Polymarket, e)
        })
    }

    /// Public listing; available without a wallet.
    async fn get_markets(&self, limit: usize) -> Result<Vec<NormalizedMarket>, VenueError> {
        let raw: Value = self
            .clob
            .get_json(
                CallKind::Listing,
                "/markets",
                Some(&format!("limit={limit}&active=true")),
            )
            .await?;
        let listed = first_parse(&raw, &LISTING_SHAPES)
            .ok_or_else(|| VenueError::schema("unrecognized market listing shape"))?;

        Ok(listed
            .iter()
            .filter_map(|m| match normalize_polymarket(m) {
                Ok(market) => Some(market),
                Err(reason) => {
                    tracing::trace!(market = ?m.condition_id, ?reason, "skipping market");
                    None
                }
            })
            .collect())
    }
}
