//! Canonical description of an outgoing request, independent of any HTTP
//! client.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// HTTP methods the desk issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FreshClock
// =============================================================================

static GLOBAL_CLOCK: FreshClock = FreshClock::new();

/// Millisecond wall clock that never hands out the same value twice.
///
/// Two requests signed within the same millisecond would otherwise carry the
/// same timestamp, which some venues reject as a replay.
#[derive(Debug)]
pub struct FreshClock {
    last_ms: AtomicU64,
}

impl FreshClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_ms: AtomicU64::new(0),
        }
    }

    /// Process-wide clock used by [`RequestDescriptor`] constructors.
    #[must_use]
    pub fn global() -> &'static FreshClock {
        &GLOBAL_CLOCK
    }

    /// Returns a Unix timestamp in milliseconds strictly greater than every
    /// value this clock returned before.
    pub fn now_ms(&self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        let mut prev = self.last_ms.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last_ms
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for FreshClock {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RequestDescriptor
// =============================================================================

/// Everything a signer needs to know about one request.
///
/// `path` is the full URL path including any API prefix; `query` is the raw
/// query string without the leading `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub host: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
    /// Unix milliseconds, stamped at construction.
    pub timestamp_ms: u64,
}

impl RequestDescriptor {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path.into(), String::new())
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Method::Post, path.into(), body.into())
    }

    fn new(method: Method, path: String, body: String) -> Self {
        Self {
            method,
            host: String::new(),
            path,
            query: None,
            body,
            timestamp_ms: FreshClock::global().now_ms(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = if query.is_empty() { None } else { Some(query) };
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Pins the timestamp. Intended for reproducible signatures.
    #[must_use]
    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    #[must_use]
    pub fn timestamp_secs(&self) -> u64 {
        self.timestamp_ms / 1000
    }

    #[must_use]
    pub fn query_str(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    /// `path?query`, or just `path` when there is no query.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn clock_is_strictly_increasing() {
        let clock = FreshClock::new();
        let mut last = 0;
        for _ in 0..10_000 {
            let now = clock.now_ms();
            assert!(now > last);
            last = now;
        }
    }

    #[test]
    fn clock_is_unique_across_threads() {
        let clock = Arc::new(FreshClock::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || (0..1_000).map(|_| clock.now_ms()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for ts in handle.join().unwrap() {
                assert!(seen.insert(ts), "duplicate timestamp {ts}");
            }
        }
        assert_eq!(seen.len(), 4_000);
    }

    #[test]
    fn clock_tracks_wall_time() {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let now = FreshClock::new().now_ms();
        assert!(now >= wall);
        assert!(now - wall < 5_000);
    }

    #[test]
    fn descriptors_get_distinct_timestamps() {
        let a = RequestDescriptor::get("/a");
        let b = RequestDescriptor::get("/a");
        assert!(b.timestamp_ms > a.timestamp_ms);
    }

    #[test]
    fn path_and_query_formatting() {
        let plain = RequestDescriptor::get("/api/v1/crypto/trading/accounts/");
        assert_eq!(plain.path_and_query(), "/api/v1/crypto/trading/accounts/");
        assert_eq!(plain.query_str(), "");

        let queried = RequestDescriptor::get("/spot/wallets").with_query("currency=USDT");
        assert_eq!(queried.path_and_query(), "/spot/wallets?currency=USDT");
        assert_eq!(queried.query_str(), "currency=USDT");

        let empty = RequestDescriptor::get("/x").with_query("");
        assert_eq!(empty.query, None);
    }

    #[test]
    fn post_keeps_body_and_method() {
        let d = RequestDescriptor::post("/orders", r#"{"a":1}"#).at(1_706_817_600_123);
        assert_eq!(d.method, Method::Post);
        assert_eq!(d.body, r#"{"a":1}"#);
        assert_eq!(d.timestamp_secs(), 1_706_817_600);
    }
}
