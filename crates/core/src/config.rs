use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level desk configuration.
///
/// Every section has compiled defaults so an empty config file is valid.
/// Credentials are not part of this struct; they are read from the process
/// environment by the desk crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub venues: VenueUrls,
    pub scan: ScanConfig,
    pub risk: RiskLimits,
    pub simulation: SimulationSettings,
    pub consensus: ConsensusConfig,
    pub historian: HistorianSettings,
    pub event_log: EventLogConfig,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout for balance and holdings calls.
    pub balance_timeout_secs: u64,
    /// Timeout for market listing calls.
    pub market_timeout_secs: u64,
    /// Per-adapter request budget.
    pub requests_per_minute: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            balance_timeout_secs: 10,
            market_timeout_secs: 15,
            requests_per_minute: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueUrls {
    pub kalshi_base_url: String,
    pub kalshi_api_prefix: String,
    pub polymarket_clob_url: String,
    pub polymarket_gamma_url: String,
    /// JSON-RPC endpoints tried in order for on-chain balances.
    pub polygon_rpc_urls: Vec<String>,
    pub usdc_contract: String,
    pub robinhood_base_url: String,
    pub coinbase_base_url: String,
    /// Host embedded in signed-token resource claims.
    pub coinbase_host: String,
    pub phemex_base_url: String,
    /// Public price-history API for crypto underlyings.
    pub coingecko_url: String,
}

impl Default for VenueUrls {
    fn default() -> Self {
        Self {
            kalshi_base_url: "https://api.elections.kalshi.com".to_string(),
            kalshi_api_prefix: "/trade-api/v2".to_string(),
            polymarket_clob_url: "https://clob.polymarket.com".to_string(),
            polymarket_gamma_url: "https://gamma-api.polymarket.com".to_string(),
            polygon_rpc_urls: vec![
                "https://polygon-rpc.com".to_string(),
                "https://rpc.ankr.com/polygon".to_string(),
            ],
            usdc_contract: "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174".to_string(),
            robinhood_base_url: "https://trading.robinhood.com".to_string(),
            coinbase_base_url: "https://api.coinbase.com".to_string(),
            coinbase_host: "api.coinbase.com".to_string(),
            phemex_base_url: "https://api.phemex.com".to_string(),
            coingecko_url: "https://api.coingecko.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// YES + NO below this sum is flagged as arbitrage.
    pub arbitrage_sum_threshold: Decimal,
    /// Minimum YES ask - bid to flag a wide spread.
    pub min_spread: Decimal,
    /// Number of opportunities kept after ranking.
    pub top_n: usize,
    /// Markets requested per venue listing.
    pub market_limit: usize,
    /// Events requested from the event-based venue.
    pub event_limit: usize,
    /// Events whose markets are expanded per scan.
    pub events_scanned: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            arbitrage_sum_threshold: Decimal::new(98, 2),
            min_spread: Decimal::new(5, 2),
            top_n: 10,
            market_limit: 20,
            event_limit: 10,
            events_scanned: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Maximum single position as a fraction of bankroll.
    pub max_position_pct: f64,
    /// Daily loss limit as a fraction of bankroll.
    pub daily_loss_pct: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_pct: 0.10,
            daily_loss_pct: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub trials: usize,
    /// Fixed seed for reproducible runs; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Model asked for the variables driving a question.
    pub extractor: EstimatorConfig,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            trials: 10_000,
            seed: Some(42),
            extractor: EstimatorConfig::new("extractor", EstimatorProvider::OpenAi, "gpt-4o-mini"),
        }
    }
}

/// LLM provider backing a consensus estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorProvider {
    OpenAi,
    Anthropic,
}

/// What an estimator asks its model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    /// Direct probability forecast.
    #[default]
    Forecaster,
    /// Base rate from historical precedents.
    Historian,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Stable identity used to order votes.
    pub id: String,
    pub provider: EstimatorProvider,
    pub model: String,
    /// Overrides the provider's API root, for proxies or self-hosted gateways.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub kind: EstimatorKind,
}

impl EstimatorConfig {
    pub fn new(id: &str, provider: EstimatorProvider, model: &str) -> Self {
        Self {
            id: id.to_string(),
            provider,
            model: model.to_string(),
            base_url: None,
            kind: EstimatorKind::Forecaster,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EstimatorKind) -> Self {
        self.kind = kind;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorianSettings {
    pub estimator: EstimatorConfig,
}

impl Default for HistorianSettings {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::new(
                "historian",
                EstimatorProvider::Anthropic,
                "claude-haiku-4-5-20251001",
            )
            .with_kind(EstimatorKind::Historian),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Maximum estimator calls in flight.
    pub workers: usize,
    pub timeout_secs: u64,
    pub estimators: Vec<EstimatorConfig>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            timeout_secs: 15,
            estimators: vec![
                EstimatorConfig::new(
                    "claude-haiku",
                    EstimatorProvider::Anthropic,
                    "claude-haiku-4-5-20251001",
                ),
                EstimatorConfig::new("gpt-4o", EstimatorProvider::OpenAi, "gpt-4o"),
                EstimatorConfig::new("gpt-4o-mini", EstimatorProvider::OpenAi, "gpt-4o-mini"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Webhook receiving `{source, event_type, content}`; tracing only when unset.
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub interval_secs: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
        }
    }
}
