use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SYMBOLS: &[&str] = &["BTC", "ETH", "XRP", "LTC", "ADA"];

/// Runtime configuration, loaded from the environment with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supported ticker symbols (uppercase).
    pub symbols: Vec<String>,
    /// Days of history per input window.
    pub look_back: usize,
    /// Chronological train/validation split fraction.
    pub train_fraction: f64,
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub predictions_dir: PathBuf,
    pub bind_addr: String,
    pub market_data_base_url: String,
    /// First day of history to download.
    pub fetch_start: NaiveDate,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let symbols: Vec<String> = env::var("SYMBOLS")
            .unwrap_or_else(|_| DEFAULT_SYMBOLS.join(","))
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            anyhow::bail!("SYMBOLS must name at least one symbol");
        }

        let look_back: usize = env::var("LOOK_BACK")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("Invalid LOOK_BACK")?;
        if look_back == 0 {
            anyhow::bail!("LOOK_BACK must be at least 1");
        }

        let train_fraction: f64 = env::var("TRAIN_FRACTION")
            .unwrap_or_else(|_| "0.8".to_string())
            .parse()
            .context("Invalid TRAIN_FRACTION")?;
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            anyhow::bail!(
                "TRAIN_FRACTION must be strictly between 0 and 1, got {}",
                train_fraction
            );
        }

        let fetch_start_str =
            env::var("FETCH_START").unwrap_or_else(|_| "2020-01-01".to_string());
        let fetch_start = NaiveDate::parse_from_str(&fetch_start_str, "%Y-%m-%d")
            .with_context(|| format!("Invalid FETCH_START: {}", fetch_start_str))?;

        Ok(Self {
            symbols,
            look_back,
            train_fraction,
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()).into(),
            models_dir: env::var("MODELS_DIR")
                .unwrap_or_else(|_| "models".to_string())
                .into(),
            predictions_dir: env::var("PREDICTIONS_DIR")
                .unwrap_or_else(|_| "predictions".to_string())
                .into(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8001".to_string()),
            market_data_base_url: env::var("MARKET_DATA_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            fetch_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests run serially under `cargo test -- --test-threads=1` or
    // rely on distinct variable names; these only exercise the defaults and
    // the pure validation paths.

    #[test]
    fn test_defaults() {
        // Only valid when the variables are unset in the test environment
        for key in ["SYMBOLS", "LOOK_BACK", "TRAIN_FRACTION", "FETCH_START"] {
            if env::var(key).is_ok() {
                return;
            }
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.symbols, DEFAULT_SYMBOLS);
        assert_eq!(config.look_back, 60);
        assert_eq!(config.train_fraction, 0.8);
        assert_eq!(
            config.fetch_start,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }
}
