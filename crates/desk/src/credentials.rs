//! Venue and provider secrets read from the process environment.
//!
//! A variable that is absent or blank leaves its venue unconfigured. PEM
//! values may carry literal `\n` sequences, which are expanded.

use secrecy::SecretString;
use tradedesk_auth::{expand_escaped_newlines, Credential, SigningScheme};
use tradedesk_fair_value::ProviderKeys;

pub const KALSHI_API_KEY_ID: &str = "KALSHI_API_KEY_ID";
pub const KALSHI_PRIVATE_KEY: &str = "KALSHI_PRIVATE_KEY";
pub const POLY_WALLET_ADDRESS: &str = "POLY_WALLET_ADDRESS";
pub const ROBINHOOD_API_KEY: &str = "ROBINHOOD_API_KEY";
pub const ROBINHOOD_PRIVATE_KEY: &str = "ROBINHOOD_PRIVATE_KEY";
pub const COINBASE_API_KEY: &str = "COINBASE_API_KEY";
pub const COINBASE_API_SECRET: &str = "COINBASE_API_SECRET";
pub const PHEMEX_API_KEY: &str = "PHEMEX_API_KEY";
pub const PHEMEX_API_SECRET: &str = "PHEMEX_API_SECRET";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Default)]
pub struct DeskCredentials {
    pub kalshi: Option<Credential>,
    pub polymarket_wallet: Option<String>,
    pub robinhood: Option<Credential>,
    pub coinbase: Option<Credential>,
    pub phemex: Option<Credential>,
    pub openai: Option<SecretString>,
    pub anthropic: Option<SecretString>,
}

impl DeskCredentials {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any name -> value lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let pair = |key: &str, secret: &str, scheme: SigningScheme, pem: bool| {
            let key_id = get(key)?;
            let secret = get(secret)?;
            let secret = if pem {
                expand_escaped_newlines(&secret)
            } else {
                secret
            };
            Some(Credential::new(key_id.trim(), secret, scheme))
        };

        Self {
            kalshi: pair(KALSHI_API_KEY_ID, KALSHI_PRIVATE_KEY, SigningScheme::RsaPss, true),
            polymarket_wallet: get(POLY_WALLET_ADDRESS).map(|w| w.trim().to_string()),
            robinhood: pair(ROBINHOOD_API_KEY, ROBINHOOD_PRIVATE_KEY, SigningScheme::Ed25519, false),
            coinbase: pair(COINBASE_API_KEY, COINBASE_API_SECRET, SigningScheme::Es256Jwt, true),
            phemex: pair(PHEMEX_API_KEY, PHEMEX_API_SECRET, SigningScheme::HmacSha256, false),
            openai: get(OPENAI_API_KEY).map(SecretString::from),
            anthropic: get(ANTHROPIC_API_KEY).map(SecretString::from),
        }
    }

    #[must_use]
    pub fn provider_keys(&self) -> ProviderKeys {
        ProviderKeys {
            openai: self.openai.clone(),
            anthropic: self.anthropic.clone(),
        }
    }
}
