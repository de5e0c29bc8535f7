//! Conversion of venue price and balance encodings into canonical units.
//!
//! Prices end up in the `[0, 1]` probability domain and amounts in plain
//! currency decimals. Every divisor is fixed per field; nothing here guesses a
//! scale from the magnitude of a value.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tradedesk_core::{NormalizedMarket, Venue, VenueError};

/// Why a raw market was left out of a listing. Skipping is expected for
/// illiquid or settled markets and is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPrices,
    NonPositivePrice,
    /// A price at or above 1, outside the probability domain.
    PriceOutOfRange,
    Closed,
    /// The entry does not fit the raw market shape at all.
    Malformed,
}

/// Decodes each listing entry on its own; entries that do not fit `T` are
/// logged and dropped so the rest of the listing survives.
pub fn decode_entries<T: DeserializeOwned>(items: &[Value]) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::debug!(reason = ?SkipReason::Malformed, error = %e, "skipping market");
                None
            }
        })
        .collect()
}

fn check_prices(yes_price: Decimal, no_price: Decimal) -> Result<(), SkipReason> {
    if yes_price <= Decimal::ZERO || no_price <= Decimal::ZERO {
        return Err(SkipReason::NonPositivePrice);
    }
    if yes_price >= Decimal::ONE || no_price >= Decimal::ONE {
        return Err(SkipReason::PriceOutOfRange);
    }
    Ok(())
}

// =============================================================================
// Scalar helpers
// =============================================================================

/// Interprets `raw` as a fixed-point integer with `decimals` fractional digits.
#[must_use]
pub fn scale_integer(raw: i64, decimals: u32) -> Decimal {
    Decimal::new(raw, decimals)
}

/// Parses a `0x`-prefixed hex quantity (as returned by JSON-RPC) with
/// `decimals` fractional digits.
///
/// # Errors
/// Returns [`VenueError::SchemaMismatch`] for non-hex input or values too
/// large for a decimal.
pub fn parse_hex_quantity(hex: &str, decimals: u32) -> Result<Decimal, VenueError> {
    let digits = hex.trim().trim_start_matches("0x").trim_start_matches("0X");
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let raw = u128::from_str_radix(digits, 16)
        .map_err(|e| VenueError::schema(format!("invalid hex quantity {hex:?}: {e}")))?;
    let raw = i128::try_from(raw)
        .map_err(|_| VenueError::schema(format!("hex quantity out of range: {hex}")))?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .map_err(|e| VenueError::schema(format!("hex quantity out of range: {e}")))
}

/// Reads a decimal from a JSON string or number.
#[must_use]
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// Reads a list that is either a JSON array or a string holding one.
fn embedded_array(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => serde_json::from_str::<Vec<Value>>(s).ok(),
        _ => None,
    }
}

// =============================================================================
// Polymarket
// =============================================================================

/// Market as listed by the CLOB or Gamma APIs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPolymarketMarket {
    #[serde(alias = "conditionId")]
    pub condition_id: Option<String>,
    pub question: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub tokens: Option<Vec<RawOutcomeToken>>,
    #[serde(rename = "outcomePrices")]
    pub outcome_prices: Option<Value>,
    pub outcomes: Option<Value>,
    #[serde(rename = "clobTokenIds")]
    pub clob_token_ids: Option<Value>,
    pub closed: Option<bool>,
    pub volume: Option<Value>,
    pub liquidity: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOutcomeToken {
    pub token_id: Option<String>,
    pub outcome: Option<String>,
    pub price: Option<Value>,
}

impl RawPolymarketMarket {
    /// Token ids in outcome order, from either encoding.
    #[must_use]
    pub fn token_ids(&self) -> Vec<String> {
        if let Some(tokens) = &self.tokens {
            let ids: Vec<String> = tokens.iter().filter_map(|t| t.token_id.clone()).collect();
            if !ids.is_empty() {
                return ids;
            }
        }
        self.clob_token_ids
            .as_ref()
            .and_then(embedded_array)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

/// Picks YES/NO from labelled pairs, falling back to positions 0 and 1.
fn yes_no<T: Copy>(pairs: &[(Option<String>, T)]) -> Option<(T, T)> {
    let find = |label: &str| {
        pairs
            .iter()
            .find(|(name, _)| name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(label)))
            .map(|(_, v)| *v)
    };
    match (find("yes"), find("no")) {
        (Some(yes), Some(no)) => Some((yes, no)),
        _ if pairs.len() >= 2 => Some((pairs[0].1, pairs[1].1)),
        _ => None,
    }
}

fn token_prices(tokens: &[RawOutcomeToken]) -> Option<(Decimal, Decimal)> {
    let priced: Vec<(Option<String>, Decimal)> = tokens
        .iter()
        .filter_map(|t| {
            let price = t.price.as_ref().and_then(decimal_from_value)?;
            Some((t.outcome.clone(), price))
        })
        .collect();
    if priced.len() < 2 {
        return None;
    }
    yes_no(&priced)
}

fn outcome_prices(raw: &RawPolymarketMarket) -> Option<(Decimal, Decimal)> {
    let prices: Vec<Decimal> = embedded_array(raw.outcome_prices.as_ref()?)?
        .iter()
        .map(decimal_from_value)
        .collect::<Option<_>>()?;
    if prices.len() < 2 {
        return None;
    }
    let labels: Vec<Option<String>> = raw
        .outcomes
        .as_ref()
        .and_then(embedded_array)
        .map(|items| items.iter().map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let pairs: Vec<(Option<String>, Decimal)> = prices
        .into_iter()
        .enumerate()
        .map(|(i, p)| (labels.get(i).cloned().flatten(), p))
        .collect();
    yes_no(&pairs)
}

/// Normalizes a Polymarket listing entry.
///
/// A `tokens` array with at least two priced entries wins over the
/// string-encoded `outcomePrices` field.
pub fn normalize_polymarket(raw: &RawPolymarketMarket) -> Result<NormalizedMarket, SkipReason> {
    if raw.closed == Some(true) {
        return Err(SkipReason::Closed);
    }

    let (yes_price, no_price) = raw
        .tokens
        .as_deref()
        .and_then(token_prices)
        .or_else(|| outcome_prices(raw))
        .ok_or(SkipReason::MissingPrices)?;

    check_prices(yes_price, no_price)?;

    Ok(NormalizedMarket {
        venue: Venue::Polymarket,
        market_id: raw
            .condition_id
            .clone()
            .or_else(|| raw.slug.clone())
            .unwrap_or_default(),
        question: raw
            .question
            .clone()
            .or_else(|| raw.title.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        yes_price,
        no_price,
        yes_bid: None,
        volume: raw.volume.as_ref().and_then(decimal_from_value),
        liquidity: raw.liquidity.as_ref().and_then(decimal_from_value),
    })
}

// =============================================================================
// Kalshi
// =============================================================================

/// Market as returned by `GET /markets`.
///
/// Prices come either as integer cents or as `*_dollars` decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawKalshiMarket {
    pub ticker: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub yes_ask: Option<i64>,
    pub no_ask: Option<i64>,
    pub yes_bid: Option<i64>,
    pub yes_ask_dollars: Option<String>,
    pub no_ask_dollars: Option<String>,
    pub yes_bid_dollars: Option<String>,
    pub volume: Option<i64>,
    pub liquidity: Option<i64>,
    pub liquidity_dollars: Option<String>,
}

fn dollars_or_cents(dollars: Option<&str>, cents: Option<i64>) -> Option<Decimal> {
    dollars
        .and_then(|s| Decimal::from_str(s.trim()).ok())
        .or_else(|| cents.map(|c| scale_integer(c, 2)))
}

/// Normalizes a Kalshi market. `event_title` is used when the market has no
/// title of its own.
pub fn normalize_kalshi(
    raw: &RawKalshiMarket,
    event_title: &str,
) -> Result<NormalizedMarket, SkipReason> {
    if matches!(
        raw.status.as_deref(),
        Some("closed" | "settled" | "finalized")
    ) {
        return Err(SkipReason::Closed);
    }

    let yes_price = dollars_or_cents(raw.yes_ask_dollars.as_deref(), raw.yes_ask);
    let no_price = dollars_or_cents(raw.no_ask_dollars.as_deref(), raw.no_ask);
    let (Some(yes_price), Some(no_price)) = (yes_price, no_price) else {
        return Err(SkipReason::MissingPrices);
    };
    check_prices(yes_price, no_price)?;

    Ok(NormalizedMarket {
        venue: Venue::Kalshi,
        market_id: raw.ticker.clone().unwrap_or_default(),
        question: raw
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| event_title.to_string()),
        yes_price,
        no_price,
        yes_bid: dollars_or_cents(raw.yes_bid_dollars.as_deref(), raw.yes_bid)
            .filter(|bid| *bid > Decimal::ZERO),
        volume: raw.volume.map(Decimal::from),
        liquidity: dollars_or_cents(raw.liquidity_dollars.as_deref(), raw.liquidity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn poly(value: Value) -> RawPolymarketMarket {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn divisor_follows_field_not_magnitude() {
        assert_eq!(scale_integer(100_000_000, 6), dec!(100));
        assert_eq!(scale_integer(100_000_000, 8), dec!(1));
        assert_eq!(scale_integer(12_345, 2), dec!(123.45));
    }

    #[test]
    fn hex_quantities() {
        assert_eq!(parse_hex_quantity("0x5f5e100", 6).unwrap(), dec!(100));
        assert_eq!(parse_hex_quantity("0x", 6).unwrap(), Decimal::ZERO);
        assert_eq!(
            parse_hex_quantity("0x0000000000000000000000000000000000000000000000000000000000989680", 6)
                .unwrap(),
            dec!(10)
        );
        assert!(matches!(
            parse_hex_quantity("0xzz", 6),
            Err(VenueError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn decimal_from_string_or_number() {
        assert_eq!(decimal_from_value(&json!("0.45")), Some(dec!(0.45)));
        assert_eq!(decimal_from_value(&json!(0.5)), Some(dec!(0.5)));
        assert_eq!(decimal_from_value(&json!(3)), Some(dec!(3)));
        assert_eq!(decimal_from_value(&json!(null)), None);
        assert_eq!(decimal_from_value(&json!("n/a")), None);
    }

    #[test]
    fn polymarket_tokens() {
        let raw = poly(json!({
            "condition_id": "0xabc",
            "question": "Will it rain?",
            "tokens": [
                {"token_id": "1", "outcome": "Yes", "price": 0.45},
                {"token_id": "2", "outcome": "No", "price": "0.50"}
            ]
        }));
        let market = normalize_polymarket(&raw).unwrap();
        assert_eq!(market.market_id, "0xabc");
        assert_eq!(market.yes_price, dec!(0.45));
        assert_eq!(market.no_price, dec!(0.50));
        assert_eq!(market.price_sum(), dec!(0.95));
    }

    #[test]
    fn polymarket_tokens_matched_by_label() {
        let raw = poly(json!({
            "tokens": [
                {"outcome": "No", "price": 0.7},
                {"outcome": "Yes", "price": 0.2}
            ]
        }));
        let market = normalize_polymarket(&raw).unwrap();
        assert_eq!(market.yes_price, dec!(0.2));
        assert_eq!(market.no_price, dec!(0.7));
        assert_eq!(market.question, "Unknown");
    }

    #[test]
    fn polymarket_string_encoded_outcome_prices() {
        let raw = poly(json!({
            "conditionId": "0xdef",
            "question": "Q?",
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"0.3\", \"0.6\"]"
        }));
        let market = normalize_polymarket(&raw).unwrap();
        assert_eq!(market.market_id, "0xdef");
        assert_eq!(market.yes_price, dec!(0.3));
        assert_eq!(market.no_price, dec!(0.6));
    }

    #[test]
    fn polymarket_numeric_outcome_prices() {
        let raw = poly(json!({"outcomePrices": "[0.25, 0.7]"}));
        let market = normalize_polymarket(&raw).unwrap();
        assert_eq!(market.yes_price, dec!(0.25));
    }

    #[test]
    fn polymarket_prefers_tokens_when_both_present() {
        let raw = poly(json!({
            "tokens": [{"outcome": "Yes", "price": 0.4}, {"outcome": "No", "price": 0.55}],
            "outcomePrices": "[\"0.9\", \"0.1\"]"
        }));
        let market = normalize_polymarket(&raw).unwrap();
        assert_eq!(market.yes_price, dec!(0.4));
    }

    #[test]
    fn polymarket_falls_back_when_tokens_unpriced() {
        let raw = poly(json!({
            "tokens": [{"outcome": "Yes"}, {"outcome": "No"}],
            "outcomePrices": "[\"0.9\", \"0.1\"]"
        }));
        let market = normalize_polymarket(&raw).unwrap();
        assert_eq!(market.yes_price, dec!(0.9));
        assert_eq!(market.no_price, dec!(0.1));
    }

    #[test]
    fn polymarket_skips() {
        assert_eq!(
            normalize_polymarket(&poly(json!({"question": "Q"}))).unwrap_err(),
            SkipReason::MissingPrices
        );
        assert_eq!(
            normalize_polymarket(&poly(json!({"outcomePrices": "[\"0\", \"1\"]"}))).unwrap_err(),
            SkipReason::NonPositivePrice
        );
        assert_eq!(
            normalize_polymarket(&poly(json!({"closed": true, "outcomePrices": "[\"0.5\", \"0.5\"]"})))
                .unwrap_err(),
            SkipReason::Closed
        );
        assert_eq!(
            normalize_polymarket(&poly(json!({"outcomePrices": "not json"}))).unwrap_err(),
            SkipReason::MissingPrices
        );
    }

    #[test]
    fn prices_at_or_above_one_are_skipped() {
        assert_eq!(
            normalize_polymarket(&poly(json!({"outcomePrices": "[\"1\", \"0.02\"]"}))).unwrap_err(),
            SkipReason::PriceOutOfRange
        );
        assert_eq!(
            normalize_polymarket(&poly(json!({"outcomePrices": "[\"0.4\", \"1.5\"]"}))).unwrap_err(),
            SkipReason::PriceOutOfRange
        );
        let full_ask = RawKalshiMarket {
            yes_ask: Some(100),
            no_ask: Some(3),
            ..Default::default()
        };
        assert_eq!(
            normalize_kalshi(&full_ask, "").unwrap_err(),
            SkipReason::PriceOutOfRange
        );
    }

    #[test]
    fn undecodable_entries_are_dropped_individually() {
        let items = vec![
            json!({"condition_id": "0x1", "outcomePrices": "[\"0.3\", \"0.7\"]"}),
            json!({"condition_id": "0x2", "closed": "false", "outcomePrices": "[\"0.3\", \"0.6\"]"}),
            json!({"condition_id": "0x3", "tokens": [{"token_id": 42, "price": 0.4}]}),
            json!({"condition_id": "0x4"}),
        ];
        let decoded: Vec<RawPolymarketMarket> = decode_entries(&items);
        let ids: Vec<_> = decoded.iter().filter_map(|m| m.condition_id.as_deref()).collect();
        assert_eq!(ids, vec!["0x1", "0x4"]);
    }

    #[test]
    fn polymarket_token_ids_from_either_encoding() {
        let with_tokens = poly(json!({"tokens": [{"token_id": "111"}, {"token_id": "222"}]}));
        assert_eq!(with_tokens.token_ids(), vec!["111", "222"]);
        let gamma = poly(json!({"clobTokenIds": "[\"333\", \"444\"]"}));
        assert_eq!(gamma.token_ids(), vec!["333", "444"]);
    }

    #[test]
    fn kalshi_cents() {
        let raw = RawKalshiMarket {
            ticker: Some("KXBTC-T".to_string()),
            title: Some("BTC above 100k?".to_string()),
            yes_ask: Some(45),
            no_ask: Some(50),
            yes_bid: Some(38),
            volume: Some(1200),
            ..Default::default()
        };
        let market = normalize_kalshi(&raw, "Event").unwrap();
        assert_eq!(market.yes_price, dec!(0.45));
        assert_eq!(market.no_price, dec!(0.50));
        assert_eq!(market.yes_bid, Some(dec!(0.38)));
        assert_eq!(market.volume, Some(dec!(1200)));
        assert_eq!(market.question, "BTC above 100k?");
    }

    #[test]
    fn kalshi_dollar_strings_win_over_cents() {
        let raw = RawKalshiMarket {
            yes_ask: Some(99),
            no_ask: Some(99),
            yes_ask_dollars: Some("0.4500".to_string()),
            no_ask_dollars: Some("0.5600".to_string()),
            yes_bid: Some(0),
            ..Default::default()
        };
        let market = normalize_kalshi(&raw, "Fallback title").unwrap();
        assert_eq!(market.yes_price, dec!(0.45));
        assert_eq!(market.no_price, dec!(0.56));
        assert_eq!(market.yes_bid, None);
        assert_eq!(market.question, "Fallback title");
    }

    #[test]
    fn kalshi_skips() {
        let missing = RawKalshiMarket {
            yes_ask: Some(40),
            ..Default::default()
        };
        assert_eq!(
            normalize_kalshi(&missing, "").unwrap_err(),
            SkipReason::MissingPrices
        );

        let zero = RawKalshiMarket {
            yes_ask: Some(0),
            no_ask: Some(60),
            ..Default::default()
        };
        assert_eq!(
            normalize_kalshi(&zero, "").unwrap_err(),
            SkipReason::NonPositivePrice
        );

        let settled = RawKalshiMarket {
            status: Some("settled".to_string()),
            yes_ask: Some(40),
            no_ask: Some(60),
            ..Default::default()
        };
        assert_eq!(normalize_kalshi(&settled, "").unwrap_err(), SkipReason::Closed);
    }
}
