//! The desk: every venue adapter plus the advisory engines behind one handle.
//!
//! On-demand commands and the snapshot scheduler both call the same entry
//! points; nothing here holds mutable state between calls.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tradedesk_core::{
    AppConfig, Balance, BalanceStatus, ConsensusConfig, EventLog, Holding, RiskLimits,
    TracingEventLog, Venue, VenueAdapter, VenueError,
};
use tradedesk_fair_value::{
    evaluate, extract_variables, simulate, ConsensusEngine, ConsensusResult, EdgeAssessment,
    HistorianEstimator, HistoricalAnalysis, Llm, ProviderKeys, SimulationConfig, SimulationSummary,
    VariableExtraction,
};
use tradedesk_risk::RiskAnalysis;
use tradedesk_signals::{
    analyze_depth, analyze_prices, DepthAnalysis, OpportunityScanner, ScanOutcome,
    TechnicalSnapshot, TechnicalsConfig,
};
use tradedesk_venues::{
    CoinbaseAdapter, KalshiAdapter, PhemexAdapter, PolymarketAdapter, PriceHistoryClient,
    RobinhoodAdapter,
};

use crate::credentials::DeskCredentials;
use crate::event_log::HttpEventLog;
use crate::report;

/// Event source for everything the desk logs.
pub const EVENT_SOURCE: &str = "desk";
pub const PORTFOLIO_EVENT: &str = "portfolio_snapshot";
pub const SCAN_EVENT: &str = "ev_scan";

/// Currencies counted at face value in the cash total.
const DOLLAR_CURRENCIES: [&str; 3] = ["USD", "USDC", "USDT"];

// =============================================================================
// Results
// =============================================================================

/// Balance and holdings observed on one venue.
#[derive(Debug, Clone)]
pub struct VenueSnapshot {
    pub balance: Balance,
    pub holdings: Vec<Holding>,
    /// Set when the balance succeeded but the holdings call did not.
    pub holdings_error: Option<VenueError>,
}

impl VenueSnapshot {
    #[must_use]
    pub fn venue(&self) -> Venue {
        self.balance.venue
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub taken_at: DateTime<Utc>,
    /// One entry per adapter, in adapter order.
    pub venues: Vec<VenueSnapshot>,
}

impl PortfolioSnapshot {
    /// Sum of dollar and stablecoin balances.
    #[must_use]
    pub fn cash_total_usd(&self) -> Decimal {
        self.venues
            .iter()
            .filter_map(|v| match &v.balance.status {
                BalanceStatus::Ok {
                    amount, currency, ..
                } if DOLLAR_CURRENCIES.contains(&currency.as_str()) => Some(*amount),
                _ => None,
            })
            .sum()
    }

    #[must_use]
    pub fn reporting(&self) -> usize {
        self.venues.iter().filter(|v| v.balance.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.venues
            .iter()
            .filter(|v| matches!(v.balance.status, BalanceStatus::Error(_)))
            .count()
    }
}

/// Outcome of one venue's market listing.
#[derive(Debug, Clone)]
pub struct VenueListing {
    pub venue: Venue,
    /// Markets returned, or why the listing failed.
    pub markets: Result<usize, VenueError>,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scanned_at: DateTime<Utc>,
    pub listings: Vec<VenueListing>,
    pub markets_scanned: usize,
    pub outcome: ScanOutcome,
}

/// Which venues and collaborators have what they need to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationStatus {
    pub venues: Vec<(Venue, bool)>,
    pub collaborators: Vec<(String, bool)>,
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub question: String,
    pub extraction: VariableExtraction,
    pub summary: SimulationSummary,
    pub assessment: EdgeAssessment,
}

#[derive(Debug, Clone)]
pub struct LiquidityReport {
    /// Market question, or the raw input when no market matched.
    pub market: String,
    pub token_id: String,
    pub analysis: DepthAnalysis,
}

// =============================================================================
// Desk
// =============================================================================

pub struct Desk {
    adapters: Vec<Arc<dyn VenueAdapter>>,
    polymarket: Option<Arc<PolymarketAdapter>>,
    event_log: Arc<dyn EventLog>,
    webhook_configured: bool,
    scanner: OpportunityScanner,
    market_limit: usize,
    risk_limits: RiskLimits,
    simulation: SimulationConfig,
    extractor: Option<Arc<dyn Llm>>,
    consensus: Option<Arc<ConsensusEngine>>,
    historian: Option<Arc<HistorianEstimator>>,
    price_history: Option<Arc<PriceHistoryClient>>,
    technicals: TechnicalsConfig,
}

impl std::fmt::Debug for Desk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let venues: Vec<_> = self.adapters.iter().map(|a| a.venue()).collect();
        f.debug_struct("Desk")
            .field("venues", &venues)
            .field("webhook_configured", &self.webhook_configured)
            .field("market_limit", &self.market_limit)
            .field("consensus", &self.consensus)
            .field("historian", &self.historian)
            .finish_non_exhaustive()
    }
}

impl Desk {
    /// Desk over the given adapters, without model-backed engines.
    #[must_use]
    pub fn new(
        adapters: Vec<Arc<dyn VenueAdapter>>,
        event_log: Arc<dyn EventLog>,
        config: &AppConfig,
    ) -> Self {
        Self {
            adapters,
            polymarket: None,
            event_log,
            webhook_configured: false,
            scanner: OpportunityScanner::new(config.scan.clone()),
            market_limit: config.scan.market_limit,
            risk_limits: config.risk.clone(),
            simulation: SimulationConfig::from(&config.simulation),
            extractor: None,
            consensus: None,
            historian: None,
            price_history: None,
            technicals: TechnicalsConfig::default(),
        }
    }

    /// Builds every adapter, the event log, and the model clients from
    /// configuration and credentials.
    ///
    /// # Errors
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, credentials: &DeskCredentials) -> Result<Self> {
        let urls = &config.venues;
        let http = &config.http;

        let polymarket = Arc::new(
            PolymarketAdapter::new(urls, http, credentials.polymarket_wallet.clone())
                .context("building Polymarket adapter")?,
        );
        let adapters: Vec<Arc<dyn VenueAdapter>> = vec![
            Arc::new(
                KalshiAdapter::new(urls, http, &config.scan, credentials.kalshi.as_ref())
                    .context("building Kalshi adapter")?,
            ),
            polymarket.clone(),
            Arc::new(
                RobinhoodAdapter::new(urls, http, credentials.robinhood.as_ref())
                    .context("building Robinhood adapter")?,
            ),
            Arc::new(
                CoinbaseAdapter::new(urls, http, credentials.coinbase.as_ref())
                    .context("building Coinbase adapter")?,
            ),
            Arc::new(
                PhemexAdapter::new(urls, http, credentials.phemex.as_ref())
                    .context("building Phemex adapter")?,
            ),
        ];

        let webhook = HttpEventLog::from_config(&config.event_log)
            .context("building event log client")?;
        let webhook_configured = webhook.is_some();
        let event_log: Arc<dyn EventLog> = match webhook {
            Some(log) => Arc::new(log),
            None => Arc::new(TracingEventLog),
        };

        let keys = credentials.provider_keys();
        let timeout = Duration::from_secs(config.consensus.timeout_secs);
        let extractor = keys
            .client_for(&config.simulation.extractor, timeout)
            .context("building extraction client")?;
        let historian = keys
            .client_for(&config.historian.estimator, timeout)
            .context("building historian client")?;
        let consensus = consensus_engine(&config.consensus, &keys)?;
        let price_history =
            PriceHistoryClient::new(urls, http).context("building price history client")?;

        let mut desk = Self::new(adapters, event_log, config)
            .with_polymarket(polymarket)
            .with_consensus(consensus)
            .with_price_history(price_history);
        desk.webhook_configured = webhook_configured;
        if let Some(llm) = extractor {
            desk = desk.with_extractor(llm);
        }
        if let Some(llm) = historian {
            desk = desk.with_historian(HistorianEstimator::new(
                &config.historian.estimator.id,
                llm,
            ));
        }
        Ok(desk)
    }

    /// Adapter used for slug lookups and order books.
    #[must_use]
    pub fn with_polymarket(mut self, adapter: Arc<PolymarketAdapter>) -> Self {
        self.polymarket = Some(adapter);
        self
    }

    /// Model that names the variables for a simulation.
    #[must_use]
    pub fn with_extractor(mut self, llm: Arc<dyn Llm>) -> Self {
        self.extractor = Some(llm);
        self
    }

    #[must_use]
    pub fn with_consensus(mut self, engine: ConsensusEngine) -> Self {
        self.consensus = Some(Arc::new(engine));
        self
    }

    #[must_use]
    pub fn with_historian(mut self, historian: HistorianEstimator) -> Self {
        self.historian = Some(Arc::new(historian));
        self
    }

    /// Source of daily closes for the technicals command.
    #[must_use]
    pub fn with_price_history(mut self, client: PriceHistoryClient) -> Self {
        self.price_history = Some(Arc::new(client));
        self
    }

    #[must_use]
    pub fn with_simulation(mut self, config: SimulationConfig) -> Self {
        self.simulation = config;
        self
    }

    // -------------------------------------------------------------------------
    // Portfolio
    // -------------------------------------------------------------------------

    /// Queries every venue concurrently. A failing venue never hides the
    /// others.
    pub async fn portfolio_snapshot(&self) -> PortfolioSnapshot {
        let venues = join_all(self.adapters.iter().map(|adapter| async move {
            let balance = adapter.get_balance().await;
            let (holdings, holdings_error) = if balance.is_ok() {
                match adapter.get_holdings().await {
                    Ok(holdings) => (holdings, None),
                    Err(e) => {
                        tracing::warn!(venue = %adapter.venue(), error = %e, "holdings lookup failed");
                        (Vec::new(), Some(e))
                    }
                }
            } else {
                (Vec::new(), None)
            };
            VenueSnapshot {
                balance,
                holdings,
                holdings_error,
            }
        }))
        .await;

        let snapshot = PortfolioSnapshot {
            taken_at: Utc::now(),
            venues,
        };
        tracing::info!(
            reporting = snapshot.reporting(),
            failed = snapshot.failed(),
            cash_total = %snapshot.cash_total_usd(),
            "portfolio snapshot taken"
        );
        snapshot
    }

    /// Renders a snapshot and records it in the event log.
    pub async fn publish_portfolio(&self, snapshot: &PortfolioSnapshot) -> String {
        let rendered = report::render_portfolio(snapshot);
        self.log(PORTFOLIO_EVENT, &rendered).await;
        rendered
    }

    pub async fn get_portfolio_snapshot(&self) -> String {
        let snapshot = self.portfolio_snapshot().await;
        self.publish_portfolio(&snapshot).await
    }

    // -------------------------------------------------------------------------
    // Opportunity scan
    // -------------------------------------------------------------------------

    /// Lists markets on every prediction venue concurrently and ranks the
    /// opportunities found.
    pub async fn opportunity_scan(&self) -> ScanReport {
        let limit = self.market_limit;
        let results = join_all(
            self.adapters
                .iter()
                .filter(|adapter| adapter.venue().lists_prediction_markets())
                .map(|adapter| async move { (adapter.venue(), adapter.get_markets(limit).await) }),
        )
        .await;

        let mut markets = Vec::new();
        let mut listings = Vec::with_capacity(results.len());
        for (venue, result) in results {
            match result {
                Ok(found) => {
                    listings.push(VenueListing {
                        venue,
                        markets: Ok(found.len()),
                    });
                    markets.extend(found);
                }
                Err(e) => {
                    tracing::warn!(venue = %venue, error = %e, "market listing failed");
                    listings.push(VenueListing {
                        venue,
                        markets: Err(e),
                    });
                }
            }
        }

        let outcome = self.scanner.scan(&markets);
        tracing::info!(
            markets = markets.len(),
            found = outcome.total_found,
            "opportunity scan complete"
        );
        ScanReport {
            scanned_at: Utc::now(),
            listings,
            markets_scanned: markets.len(),
            outcome,
        }
    }

    pub async fn run_opportunity_scan(&self) -> String {
        let scan = self.opportunity_scan().await;
        let rendered = report::render_scan(&scan);
        self.log(SCAN_EVENT, &rendered).await;
        rendered
    }

    // -------------------------------------------------------------------------
    // Advisory tools
    // -------------------------------------------------------------------------

    /// # Errors
    /// Returns an error for invalid inputs.
    pub fn run_risk_analysis(
        &self,
        question: &str,
        fair_prob: f64,
        market_price: f64,
        bankroll: f64,
    ) -> Result<String> {
        let analysis =
            RiskAnalysis::analyze(question, fair_prob, market_price, bankroll, &self.risk_limits)?;
        Ok(report::render_risk(&analysis))
    }

    /// Extracts driver variables with the configured model, simulates, and
    /// compares the result with `market_price`.
    ///
    /// # Errors
    /// Fails without an extraction model, on provider errors, or for
    /// invalid inputs.
    pub async fn simulation(
        &self,
        question: &str,
        market_price: f64,
        trials: Option<usize>,
    ) -> Result<SimulationReport> {
        check_price(market_price)?;
        let Some(llm) = &self.extractor else {
            bail!("no model configured for variable extraction; set OPENAI_API_KEY or ANTHROPIC_API_KEY");
        };
        let extraction = extract_variables(llm.as_ref(), question, market_price).await?;

        let mut config = self.simulation;
        if let Some(trials) = trials {
            config.trials = trials;
        }
        let summary = simulate(
            extraction.overall_base_probability,
            &extraction.variables,
            &config,
        )?;
        let assessment = evaluate(&summary, market_price);
        tracing::info!(
            fair_value = assessment.fair_value,
            ev_percent = assessment.ev_percent,
            signal = assessment.signal.label(),
            "simulation complete"
        );
        Ok(SimulationReport {
            question: question.to_string(),
            extraction,
            summary,
            assessment,
        })
    }

    /// # Errors
    /// See [`Desk::simulation`].
    pub async fn run_simulation(
        &self,
        question: &str,
        market_price: f64,
        trials: Option<usize>,
    ) -> Result<String> {
        let result = self.simulation(question, market_price, trials).await?;
        Ok(report::render_simulation(&result))
    }

    /// Polls every consensus estimator.
    ///
    /// # Errors
    /// Fails with no estimators configured or when none of them answers.
    pub async fn consensus(&self, question: &str, market_price: f64) -> Result<ConsensusResult> {
        check_price(market_price)?;
        let engine = match &self.consensus {
            Some(engine) if engine.estimator_count() > 0 => engine,
            _ => bail!("no consensus estimators configured; set OPENAI_API_KEY or ANTHROPIC_API_KEY"),
        };
        Ok(engine.run(question, market_price).await?)
    }

    /// # Errors
    /// See [`Desk::consensus`].
    pub async fn run_consensus(&self, question: &str, market_price: f64) -> Result<String> {
        let result = self.consensus(question, market_price).await?;
        Ok(report::render_consensus(question, &result))
    }

    /// Historical precedents and the base rate they imply.
    ///
    /// # Errors
    /// Fails without a historian model, on provider errors, or for an
    /// invalid price.
    pub async fn historical(&self, question: &str, market_price: f64) -> Result<HistoricalAnalysis> {
        check_price(market_price)?;
        let Some(historian) = &self.historian else {
            bail!("no model configured for historical analysis; set ANTHROPIC_API_KEY or OPENAI_API_KEY");
        };
        let analysis = historian.analyze(question, market_price).await?;
        tracing::info!(
            parallels = analysis.parallels.len(),
            base_rate = analysis.base_rate,
            assessment = analysis.market_assessment.label(),
            "historical analysis complete"
        );
        Ok(analysis)
    }

    /// # Errors
    /// See [`Desk::historical`].
    pub async fn run_historical(&self, question: &str, market_price: f64) -> Result<String> {
        let analysis = self.historical(question, market_price).await?;
        Ok(report::render_historical(question, market_price, &analysis))
    }

    /// Indicators over `days` of daily closes for a CoinGecko coin id.
    ///
    /// # Errors
    /// Fails for a malformed coin id, when the history cannot be fetched, or
    /// when it is too short.
    pub async fn technicals(&self, coin_id: &str, days: u32) -> Result<TechnicalSnapshot> {
        let Some(client) = &self.price_history else {
            bail!("no price history source configured");
        };
        let coin_id = coin_id.trim().to_lowercase();
        if coin_id.is_empty()
            || !coin_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            bail!("invalid coin id {coin_id:?}");
        }
        let closes = client
            .daily_closes(&coin_id, days)
            .await
            .with_context(|| format!("fetching price history for {coin_id}"))?;
        let Some(snapshot) = analyze_prices(&coin_id, &closes, &self.technicals) else {
            bail!(
                "not enough price history for {coin_id}: {} closes, need {}",
                closes.len(),
                self.technicals.min_history.max(30)
            );
        };
        Ok(snapshot)
    }

    /// # Errors
    /// See [`Desk::technicals`].
    pub async fn run_technicals(&self, coin_id: &str, days: u32) -> Result<String> {
        let snapshot = self.technicals(coin_id, days).await?;
        Ok(report::render_technicals(&snapshot))
    }

    /// Order-book depth for a market slug or a raw token id.
    ///
    /// A slug resolves to the market's first (YES) token. Input that matches
    /// no market is used as the token id directly.
    ///
    /// # Errors
    /// Fails when the order book cannot be fetched.
    pub async fn liquidity(&self, slug_or_token: &str, position_usd: Decimal) -> Result<LiquidityReport> {
        let Some(polymarket) = &self.polymarket else {
            bail!("order books need the Polymarket adapter");
        };
        if position_usd < Decimal::ZERO {
            bail!("position size must not be negative");
        }

        let (market, token_id) = match polymarket.find_market_by_slug(slug_or_token).await {
            Ok(Some(raw)) => {
                let token = raw
                    .token_ids()
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| slug_or_token.to_string());
                let name = raw
                    .question
                    .or(raw.title)
                    .unwrap_or_else(|| slug_or_token.to_string());
                (name, token)
            }
            Ok(None) => (slug_or_token.to_string(), slug_or_token.to_string()),
            Err(e) => {
                tracing::warn!(input = slug_or_token, error = %e, "slug lookup failed, using input as token id");
                (slug_or_token.to_string(), slug_or_token.to_string())
            }
        };

        let book = polymarket
            .get_order_book(&token_id)
            .await
            .with_context(|| format!("fetching order book for token {token_id}"))?;
        Ok(LiquidityReport {
            market,
            token_id,
            analysis: analyze_depth(&book, position_usd),
        })
    }

    /// # Errors
    /// See [`Desk::liquidity`].
    pub async fn run_liquidity_scan(&self, slug_or_token: &str, position_usd: Decimal) -> Result<String> {
        let result = self.liquidity(slug_or_token, position_usd).await?;
        Ok(report::render_liquidity(&result))
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn integration_status(&self) -> IntegrationStatus {
        let venues = self
            .adapters
            .iter()
            .map(|adapter| (adapter.venue(), adapter.is_configured()))
            .collect();
        let estimators = self.consensus.as_ref().map_or(0, |e| e.estimator_count());
        let collaborators = vec![
            ("Event log webhook".to_string(), self.webhook_configured),
            ("Variable extraction model".to_string(), self.extractor.is_some()),
            (format!("Consensus estimators ({estimators})"), estimators > 0),
            ("Historical precedent model".to_string(), self.historian.is_some()),
        ];
        IntegrationStatus {
            venues,
            collaborators,
        }
    }

    #[must_use]
    pub fn render_status(&self) -> String {
        report::render_status(&self.integration_status())
    }

    async fn log(&self, event_type: &str, content: &str) {
        if !self.event_log.log_event(EVENT_SOURCE, event_type, content).await {
            tracing::warn!(event_type, "event log write failed");
        }
    }
}

fn consensus_engine(config: &ConsensusConfig, keys: &ProviderKeys) -> Result<ConsensusEngine> {
    ConsensusEngine::from_config(config, keys).context("building consensus estimators")
}

fn check_price(market_price: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&market_price) {
        bail!("market price {market_price} outside [0, 1]");
    }
    Ok(())
}
