//! Periodic portfolio snapshots until Ctrl-C.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tradedesk_desk::{Desk, SnapshotScheduler};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between snapshots; defaults to `snapshot.interval_secs`
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

pub async fn run_watch(desk: Desk, args: WatchArgs, default_interval_secs: u64) -> Result<()> {
    let every = Duration::from_secs(args.interval_secs.unwrap_or(default_interval_secs));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(SnapshotScheduler::run(Arc::new(desk), every, shutdown_rx));

    tracing::info!(interval_secs = every.as_secs(), "watching portfolio, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    shutdown_tx.send(true)?;
    scheduler.await?;
    Ok(())
}
