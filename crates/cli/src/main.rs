use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tradedesk_core::{AppConfig, ConfigLoader};
use tradedesk_desk::{Desk, DeskCredentials};

mod commands;

use commands::{
    ConsensusArgs, HistoryArgs, LiquidityArgs, RiskArgs, SimulateArgs, TechnicalsArgs, WatchArgs,
};

#[derive(Parser, Debug)]
#[command(name = "tradedesk")]
#[command(about = "Multi-venue balances, opportunity scans, and advisory sizing", long_about = None)]
struct Cli {
    /// Layer config/Config.{profile}.toml over config/Config.toml
    #[arg(long, global = true, env = "TRADEDESK_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Balances and holdings on every venue
    Portfolio,
    /// Rank arbitrage and wide-spread opportunities across prediction venues
    Scan,
    /// Show which venues and collaborators are configured
    Status,
    /// Take a portfolio snapshot on a fixed interval until Ctrl-C
    Watch(WatchArgs),
    /// Monte Carlo fair value from model-extracted variables
    Simulate(SimulateArgs),
    /// Poll several models for a fair probability
    Consensus(ConsensusArgs),
    /// Base rate and fair probability from historical precedents
    History(HistoryArgs),
    /// Kelly sizing and risk of ruin for a YES position
    Risk(RiskArgs),
    /// Order-book depth and slippage for a Polymarket market
    Liquidity(LiquidityArgs),
    /// RSI, MACD, and Bollinger bands for a crypto underlying
    Technicals(TechnicalsArgs),
}

fn load_config(profile: Option<&str>) -> Result<AppConfig> {
    match profile {
        Some(profile) => ConfigLoader::load_with_profile(profile)
            .with_context(|| format!("loading config profile {profile}")),
        None => ConfigLoader::load().context("loading config"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.profile.as_deref())?;
    let credentials = DeskCredentials::from_env();
    let desk = Desk::from_config(&config, &credentials)?;

    match cli.command {
        Commands::Portfolio => println!("{}", desk.get_portfolio_snapshot().await),
        Commands::Scan => println!("{}", desk.run_opportunity_scan().await),
        Commands::Status => println!("{}", desk.render_status()),
        Commands::Watch(args) => {
            commands::run_watch(desk, args, config.snapshot.interval_secs).await?;
        }
        Commands::Simulate(args) => commands::run_simulate(&desk, args).await?,
        Commands::Consensus(args) => commands::run_consensus(&desk, args).await?,
        Commands::History(args) => commands::run_history(&desk, args).await?,
        Commands::Risk(args) => commands::run_risk(&desk, &args)?,
        Commands::Liquidity(args) => commands::run_liquidity(&desk, args).await?,
        Commands::Technicals(args) => commands::run_technicals(&desk, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("tradedesk").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn advisory_defaults() {
        match parse(&["simulate", "Will it rain?"]).unwrap().command {
            Commands::Simulate(args) => {
                assert_eq!(args.question, "Will it rain?");
                assert_eq!(args.market_price, 0.05);
                assert_eq!(args.trials, 10_000);
            }
            other => panic!("unexpected command {other:?}"),
        }
        match parse(&["consensus", "Q?", "0.3"]).unwrap().command {
            Commands::Consensus(args) => assert_eq!(args.market_price, 0.3),
            other => panic!("unexpected command {other:?}"),
        }
        match parse(&["liquidity", "will-it-rain"]).unwrap().command {
            Commands::Liquidity(args) => assert_eq!(args.position_size, dec!(100)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn history_and_technicals_defaults() {
        match parse(&["history", "Will the incumbent lose?"]).unwrap().command {
            Commands::History(args) => {
                assert_eq!(args.question, "Will the incumbent lose?");
                assert_eq!(args.market_price, 0.05);
            }
            other => panic!("unexpected command {other:?}"),
        }
        match parse(&["technicals"]).unwrap().command {
            Commands::Technicals(args) => {
                assert_eq!(args.coin, "bitcoin");
                assert_eq!(args.days, 90);
            }
            other => panic!("unexpected command {other:?}"),
        }
        match parse(&["technicals", "ethereum", "200"]).unwrap().command {
            Commands::Technicals(args) => assert_eq!(args.days, 200),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(parse(&["technicals", "bitcoin", "7"]).is_err());
    }

    #[test]
    fn risk_requires_all_positionals() {
        assert!(parse(&["risk", "Q?", "0.2", "0.05"]).is_err());
        match parse(&["risk", "Q?", "0.2", "0.05", "1000"]).unwrap().command {
            Commands::Risk(args) => {
                assert_eq!(args.fair_prob, 0.2);
                assert_eq!(args.bankroll, 1000.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_question_is_usage_error() {
        let err = parse(&["simulate"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert!(parse(&["liquidity"]).is_err());
    }

    #[test]
    fn global_profile_and_watch_interval() {
        let cli = parse(&["watch", "--interval-secs", "60", "--profile", "paper"]).unwrap();
        assert_eq!(cli.profile.as_deref(), Some("paper"));
        match cli.command {
            Commands::Watch(args) => assert_eq!(args.interval_secs, Some(60)),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
