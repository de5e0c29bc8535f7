use async_trait::async_trait;

/// Outbound changelog collaborator.
///
/// The desk calls this once per completed scan or snapshot with a rendered
/// markdown body. A `false` return is logged by the caller and not retried.
#[async_trait]
pub trait EventLog: Send + Sync {
    async fn log_event(&self, source: &str, event_type: &str, content: &str) -> bool;
}

/// Event log that only writes to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventLog;

#[async_trait]
impl EventLog for TracingEventLog {
    async fn log_event(&self, source: &str, event_type: &str, content: &str) -> bool {
        tracing::info!(
            source = source,
            event_type = event_type,
            content_len = content.len(),
            "{}",
            content
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_log_always_succeeds() {
        let log = TracingEventLog;
        assert!(log.log_event("desk", "ev_scan", "## EV Scan").await);
    }
}
