//! Webhook-backed event log.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tradedesk_core::{EventLog, EventLogConfig};

#[derive(Debug, Serialize)]
struct EventPayload<'a> {
    source: &'a str,
    event_type: &'a str,
    content: &'a str,
}

/// Posts each event as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct HttpEventLog {
    client: reqwest::Client,
    url: String,
}

impl HttpEventLog {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Webhook log when a URL is configured.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &EventLogConfig) -> Result<Option<Self>, reqwest::Error> {
        config
            .webhook_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self::new(url, Duration::from_secs(config.timeout_secs)))
            .transpose()
    }
}

#[async_trait]
impl EventLog for HttpEventLog {
    async fn log_event(&self, source: &str, event_type: &str, content: &str) -> bool {
        let payload = EventPayload {
            source,
            event_type,
            content,
        };
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(source, event_type, "event logged");
                true
            }
            Ok(response) => {
                tracing::warn!(
                    source,
                    event_type,
                    status = response.status().as_u16(),
                    "event log rejected"
                );
                false
            }
            Err(e) => {
                tracing::warn!(source, event_type, error = %e, "event log unreachable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn log_for(server: &MockServer) -> HttpEventLog {
        HttpEventLog::new(format!("{}/events", server.uri()), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .and(body_json(serde_json::json!({
                "source": "desk",
                "event_type": "ev_scan",
                "content": "## EV Scan",
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        assert!(log_for(&server).log_event("desk", "ev_scan", "## EV Scan").await);
    }

    #[tokio::test]
    async fn rejection_returns_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        assert!(!log_for(&server).log_event("desk", "portfolio_snapshot", "x").await);
    }

    #[tokio::test]
    async fn unreachable_returns_false() {
        let log = HttpEventLog::new("http://127.0.0.1:9/events", Duration::from_secs(1)).unwrap();
        assert!(!log.log_event("desk", "ev_scan", "x").await);
    }

    #[test]
    fn blank_url_means_no_webhook() {
        let config = EventLogConfig {
            webhook_url: Some("  ".to_string()),
            timeout_secs: 10,
        };
        assert!(HttpEventLog::from_config(&config).unwrap().is_none());
        assert!(HttpEventLog::from_config(&EventLogConfig::default()).unwrap().is_none());
    }
}
