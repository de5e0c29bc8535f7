//! Ordered fallback over endpoints and over response parsers.
//!
//! Some venues expose the same information under several paths depending on
//! account type, and have changed their payload shapes over time. Both are
//! handled as ordered lists tried front to back; the first success wins.

use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use tradedesk_core::VenueError;

/// A pure parser for one known response shape.
pub type ParseStrategy<T> = fn(&Value) -> Option<T>;

/// Calls `attempt` for each endpoint in order and returns the first success.
///
/// Every failure moves on to the next endpoint. When all endpoints fail the
/// last observed error is returned.
pub async fn first_success<'a, E, T, F, Fut>(
    endpoints: &'a [E],
    mut attempt: F,
) -> Result<T, VenueError>
where
    E: Debug,
    F: FnMut(&'a E) -> Fut,
    Fut: Future<Output = Result<T, VenueError>>,
{
    let mut last_error = VenueError::schema("no endpoints to try");
    for endpoint in endpoints {
        match attempt(endpoint).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if e.is_not_found() || matches!(e, VenueError::SchemaMismatch(_)) {
                    tracing::debug!(endpoint = ?endpoint, error = %e, "endpoint unavailable, trying next");
                } else {
                    tracing::warn!(endpoint = ?endpoint, error = %e, "endpoint failed, trying next");
                }
                last_error = e;
            }
        }
    }
    Err(last_error)
}

/// Runs each strategy against `value` and returns the first match.
pub fn first_parse<T>(value: &Value, strategies: &[ParseStrategy<T>]) -> Option<T> {
    strategies.iter().find_map(|parse| parse(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn stops_at_first_success() {
        let calls = AtomicUsize::new(0);
        let result = first_success(&["/a", "/b", "/c"], |endpoint| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match *endpoint {
                    "/a" => Err(VenueError::rejected(404, "not found")),
                    "/b" => Ok(2),
                    _ => Ok(3),
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn returns_last_error_when_all_fail() {
        let result: Result<(), _> = first_success(&[1, 2, 3], |n| async move {
            match *n {
                1 => Err(VenueError::rejected(404, "")),
                2 => Err(VenueError::schema("bad shape")),
                _ => Err(VenueError::rejected(500, "boom")),
            }
        })
        .await;
        assert_eq!(result.unwrap_err(), VenueError::rejected(500, "boom"));
    }

    #[tokio::test]
    async fn empty_endpoint_list_is_an_error() {
        let endpoints: [&str; 0] = [];
        let result: Result<(), _> = first_success(&endpoints, |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(VenueError::SchemaMismatch(_))));
    }

    #[test]
    fn strategies_tried_in_order() {
        fn named(v: &Value) -> Option<i64> {
            v.get("a").and_then(Value::as_i64)
        }
        fn fallback(v: &Value) -> Option<i64> {
            v.get("b").and_then(Value::as_i64)
        }
        let strategies: [ParseStrategy<i64>; 2] = [named, fallback];

        assert_eq!(first_parse(&json!({"a": 1, "b": 2}), &strategies), Some(1));
        assert_eq!(first_parse(&json!({"b": 2}), &strategies), Some(2));
        assert_eq!(first_parse(&json!({"c": 3}), &strategies), None);
    }
}
