//! Daily OHLCV history download from Binance.
//!
//! Uses the public `/api/v3/klines` endpoint with interval `1d`, paginating
//! past the 1000-row response limit until the requested range is covered.

use crate::domain::market::{DailyBar, canonical_symbol};
use crate::infrastructure::http_client::{build_url_with_query, create_client};
use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest_middleware::ClientWithMiddleware;
use tracing::info;

const KLINES_PAGE_LIMIT: usize = 1000;
const DAY_MS: i64 = 86_400_000;

pub struct MarketDataClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl MarketDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: create_client(),
            base_url: base_url.into(),
        }
    }

    /// Fetches the full daily history for `symbol` from `start` to now,
    /// ascending by date.
    pub async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<DailyBar>> {
        let symbol = canonical_symbol(symbol);
        // Binance pairs quote against USDT
        let api_symbol = format!("{}USDT", symbol);
        let url = format!("{}/api/v3/klines", self.base_url);

        let mut cursor_ms = start
            .and_hms_opt(0, 0, 0)
            .context("Invalid start date")?
            .and_utc()
            .timestamp_millis();

        let mut bars: Vec<DailyBar> = Vec::new();
        loop {
            let cursor_str = cursor_ms.to_string();
            let limit_str = KLINES_PAGE_LIMIT.to_string();
            let url_with_query = build_url_with_query(
                &url,
                &[
                    ("symbol", api_symbol.as_str()),
                    ("interval", "1d"),
                    ("startTime", &cursor_str),
                    ("limit", &limit_str),
                ],
            );

            let response = self
                .client
                .get(&url_with_query)
                .send()
                .await
                .context("Failed to fetch klines from Binance")?;

            if !response.status().is_success() {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Binance klines fetch failed for {}: {}", symbol, error_text);
            }

            let klines: Vec<serde_json::Value> = response
                .json()
                .await
                .context("Failed to parse Binance klines response")?;

            let page_len = klines.len();
            let mut last_ts = cursor_ms;
            for kline in &klines {
                if let Some((ts, bar)) = kline_to_bar(kline) {
                    last_ts = ts;
                    bars.push(bar);
                }
            }

            if page_len < KLINES_PAGE_LIMIT {
                break;
            }
            cursor_ms = last_ts + DAY_MS;
        }

        info!("Fetched {} daily bars for {}", bars.len(), symbol);
        Ok(bars)
    }
}

/// Parses one kline entry `[open_time, open, high, low, close, volume, ...]`.
/// Price and volume fields arrive as strings.
fn kline_to_bar(kline: &serde_json::Value) -> Option<(i64, DailyBar)> {
    let arr = kline.as_array()?;
    if arr.len() < 6 {
        return None;
    }

    let timestamp = arr[0].as_i64()?;
    let date = Utc.timestamp_millis_opt(timestamp).single()?.date_naive();

    let open = arr[1].as_str()?.parse::<f64>().ok()?;
    let high = arr[2].as_str()?.parse::<f64>().ok()?;
    let low = arr[3].as_str()?.parse::<f64>().ok()?;
    let close = arr[4].as_str()?.parse::<f64>().ok()?;
    let volume = arr[5].as_str()?.parse::<f64>().ok()?;

    Some((
        timestamp,
        DailyBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kline_to_bar_parses_string_fields() {
        // 2024-01-02T00:00:00Z
        let kline = json!([
            1704153600000i64,
            "42000.5",
            "43100.0",
            "41500.25",
            "42800.75",
            "1234.56",
            1704239999999i64
        ]);

        let (ts, bar) = kline_to_bar(&kline).unwrap();
        assert_eq!(ts, 1704153600000);
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bar.open, 42000.5);
        assert_eq!(bar.close, 42800.75);
        assert_eq!(bar.volume, 1234.56);
    }

    #[test]
    fn test_kline_to_bar_rejects_short_entries() {
        let kline = json!([1704153600000i64, "1.0", "2.0"]);
        assert!(kline_to_bar(&kline).is_none());
    }

    #[test]
    fn test_kline_to_bar_rejects_malformed_prices() {
        let kline = json!([1704153600000i64, "not-a-number", "2", "1", "1.5", "10"]);
        assert!(kline_to_bar(&kline).is_none());
    }
}
