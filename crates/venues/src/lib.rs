//! Venue adapters for the trading desk.
//!
//! One adapter per venue, each owning its credential and signer and returning
//! normalized balances, holdings, and markets:
//!
//! - [`KalshiAdapter`]: RSA-PSS signed event contracts
//! - [`PolymarketAdapter`]: on-chain USDC balance and CLOB markets
//! - [`RobinhoodAdapter`]: Ed25519 signed crypto brokerage
//! - [`CoinbaseAdapter`]: ES256 bearer-token spot exchange
//! - [`PhemexAdapter`]: HMAC signed derivatives exchange
//!
//! [`PriceHistoryClient`] reads daily closes for crypto underlyings.

pub mod coinbase;
pub mod coingecko;
pub mod fallback;
pub mod http;
pub mod kalshi;
pub mod normalize;
pub mod phemex;
pub mod polymarket;
pub mod robinhood;

pub use coinbase::CoinbaseAdapter;
pub use coingecko::PriceHistoryClient;
pub use fallback::{first_parse, first_success, ParseStrategy};
pub use http::{AuthStatus, CallKind, SignedHttp};
pub use kalshi::KalshiAdapter;
pub use normalize::{
    normalize_kalshi, normalize_polymarket, parse_hex_quantity, scale_integer, RawKalshiMarket,
    RawPolymarketMarket, SkipReason,
};
pub use phemex::PhemexAdapter;
pub use polymarket::PolymarketAdapter;
pub use robinhood::RobinhoodAdapter;
