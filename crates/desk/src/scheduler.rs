//! Periodic portfolio snapshots.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::desk::Desk;

/// Shortest accepted snapshot interval.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct SnapshotScheduler;

impl SnapshotScheduler {
    /// Takes and publishes a portfolio snapshot every `every` until
    /// `shutdown` turns true or its sender is dropped.
    ///
    /// The first snapshot is taken one full interval after start. A failed
    /// venue is logged and the schedule carries on.
    pub async fn run(desk: Arc<Desk>, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let every = every.max(MIN_INTERVAL);
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        tracing::info!(interval_secs = every.as_secs(), "snapshot scheduler started");

        let mut runs: u64 = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    runs += 1;
                    let snapshot = desk.portfolio_snapshot().await;
                    if snapshot.failed() > 0 {
                        tracing::warn!(
                            run = runs,
                            failed = snapshot.failed(),
                            "scheduled snapshot has failed venues"
                        );
                    }
                    desk.publish_portfolio(&snapshot).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!(runs, "snapshot scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tradedesk_core::{AppConfig, Balance, EventLog, Venue, VenueAdapter, VenueError};

    struct Flaky;

    #[async_trait]
    impl VenueAdapter for Flaky {
        fn venue(&self) -> Venue {
            Venue::Kalshi
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn get_balance(&self) -> Balance {
            Balance::error(Venue::Kalshi, VenueError::transport("down"))
        }
    }

    struct Steady;

    #[async_trait]
    impl VenueAdapter for Steady {
        fn venue(&self) -> Venue {
            Venue::Phemex
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn get_balance(&self) -> Balance {
            Balance::ok(Venue::Phemex, dec!(10), "USDT")
        }
    }

    #[derive(Default)]
    struct CountingLog {
        snapshots: AtomicUsize,
    }

    #[async_trait]
    impl EventLog for CountingLog {
        async fn log_event(&self, _source: &str, event_type: &str, _content: &str) -> bool {
            if event_type == "portfolio_snapshot" {
                self.snapshots.fetch_add(1, Ordering::SeqCst);
            }
            false
        }
    }

    fn desk(log: Arc<CountingLog>) -> Arc<Desk> {
        Arc::new(Desk::new(
            vec![Arc::new(Flaky), Arc::new(Steady)],
            log,
            &AppConfig::default(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_each_interval_despite_failures() {
        let log = Arc::new(CountingLog::default());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(SnapshotScheduler::run(
            desk(log.clone()),
            Duration::from_secs(60),
            rx,
        ));

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(log.snapshots.load(Ordering::SeqCst), 2);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_runs_before_first_interval() {
        let log = Arc::new(CountingLog::default());
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(SnapshotScheduler::run(
            desk(log.clone()),
            Duration::from_secs(60),
            rx,
        ));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(log.snapshots.load(Ordering::SeqCst), 0);

        drop(tx);
        handle.await.unwrap();
    }
}
