//! Daily OHLCV market data types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data for a single symbol.
///
/// CSV casing contract: training-time files (written by `fetch_data`) carry
/// capitalized headers (`Date,Open,High,Low,Close,Volume`), while inference-time
/// files may use lowercase headers. The serde attributes below normalize this
/// boundary: serialization always emits the capitalized form, deserialization
/// accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(rename(serialize = "Date"), alias = "Date")]
    pub date: NaiveDate,
    #[serde(rename(serialize = "Open"), alias = "Open")]
    pub open: f64,
    #[serde(rename(serialize = "High"), alias = "High")]
    pub high: f64,
    #[serde(rename(serialize = "Low"), alias = "Low")]
    pub low: f64,
    #[serde(rename(serialize = "Close"), alias = "Close")]
    pub close: f64,
    #[serde(rename(serialize = "Volume"), alias = "Volume")]
    pub volume: f64,
}

/// Canonical form for a ticker symbol: trimmed and uppercased.
/// "btc" and "BTC " both key the same model and scaler artifacts.
pub fn canonical_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_symbol() {
        assert_eq!(canonical_symbol("btc"), "BTC");
        assert_eq!(canonical_symbol(" eth "), "ETH");
        assert_eq!(canonical_symbol("XRP"), "XRP");
    }

    #[test]
    fn test_bar_deserializes_capitalized_headers() {
        let data = "Date,Open,High,Low,Close,Volume\n2024-01-02,100.0,110.0,95.0,105.0,1234.5\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let bar: DailyBar = rdr.deserialize().next().unwrap().unwrap();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bar.close, 105.0);
    }

    #[test]
    fn test_bar_deserializes_lowercase_headers() {
        let data = "date,open,high,low,close,volume\n2024-01-02,100.0,110.0,95.0,105.0,1234.5\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let bar: DailyBar = rdr.deserialize().next().unwrap().unwrap();
        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.volume, 1234.5);
    }

    #[test]
    fn test_bar_serializes_capitalized_headers() {
        let bar = DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
        };
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.serialize(bar).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert!(out.starts_with("Date,Open,High,Low,Close,Volume"));
    }
}
