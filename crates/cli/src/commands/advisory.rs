//! Advisory tools: simulation, consensus, historical parallels, risk sizing,
//! liquidity, and technicals.

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;
use tradedesk_desk::Desk;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Market question
    pub question: String,

    /// Current YES price
    #[arg(default_value_t = 0.05)]
    pub market_price: f64,

    /// Number of simulated paths
    #[arg(default_value_t = 10_000)]
    pub trials: usize,
}

pub async fn run_simulate(desk: &Desk, args: SimulateArgs) -> Result<()> {
    let report = desk
        .run_simulation(&args.question, args.market_price, Some(args.trials))
        .await?;
    println!("{report}");
    Ok(())
}

#[derive(Args, Debug)]
pub struct ConsensusArgs {
    /// Market question
    pub question: String,

    /// Current YES price
    #[arg(default_value_t = 0.05)]
    pub market_price: f64,
}

pub async fn run_consensus(desk: &Desk, args: ConsensusArgs) -> Result<()> {
    let report = desk.run_consensus(&args.question, args.market_price).await?;
    println!("{report}");
    Ok(())
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Market question
    pub question: String,

    /// Current YES price
    #[arg(default_value_t = 0.05)]
    pub market_price: f64,
}

pub async fn run_history(desk: &Desk, args: HistoryArgs) -> Result<()> {
    let report = desk.run_historical(&args.question, args.market_price).await?;
    println!("{report}");
    Ok(())
}

#[derive(Args, Debug)]
pub struct RiskArgs {
    /// Market question
    pub question: String,

    /// Your fair probability of YES
    pub fair_prob: f64,

    /// Current YES price
    pub market_price: f64,

    /// Bankroll in USD
    pub bankroll: f64,
}

pub fn run_risk(desk: &Desk, args: &RiskArgs) -> Result<()> {
    let report =
        desk.run_risk_analysis(&args.question, args.fair_prob, args.market_price, args.bankroll)?;
    println!("{report}");
    Ok(())
}

#[derive(Args, Debug)]
pub struct LiquidityArgs {
    /// Polymarket market slug or CLOB token id
    pub slug_or_token_id: String,

    /// Buy size in USD used for the slippage estimate
    #[arg(default_value = "100")]
    pub position_size: Decimal,
}

pub async fn run_liquidity(desk: &Desk, args: LiquidityArgs) -> Result<()> {
    let report = desk
        .run_liquidity_scan(&args.slug_or_token_id, args.position_size)
        .await?;
    println!("{report}");
    Ok(())
}

#[derive(Args, Debug)]
pub struct TechnicalsArgs {
    /// CoinGecko coin id
    #[arg(default_value = "bitcoin")]
    pub coin: String,

    /// Days of daily closes to analyze
    #[arg(default_value_t = 90, value_parser = clap::value_parser!(u32).range(30..=365))]
    pub days: u32,
}

pub async fn run_technicals(desk: &Desk, args: TechnicalsArgs) -> Result<()> {
    let report = desk.run_technicals(&args.coin, args.days).await?;
    println!("{report}");
    Ok(())
}
