//! Downloads daily OHLCV history for every configured symbol and writes one
//! CSV per symbol under the data directory. A failing symbol is reported and
//! skipped; the batch continues.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use cryptocast::application::batch::BatchReport;
use cryptocast::infrastructure::csv_store;
use cryptocast::infrastructure::market_data::MarketDataClient;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download daily OHLCV history per symbol")]
struct Args {
    /// Comma-separated symbols to download
    #[arg(long, default_value = "BTC,ETH,XRP,LTC,ADA")]
    symbols: String,

    /// Output directory for per-symbol CSV files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// First day of history to download (YYYY-MM-DD)
    #[arg(long, default_value = "2020-01-01")]
    start: NaiveDate,

    /// Market data API base URL
    #[arg(long, default_value = "https://api.binance.com")]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let symbols: Vec<String> = args
        .symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    let client = MarketDataClient::new(args.base_url);
    let mut report = BatchReport::new("fetch_data");

    for symbol in &symbols {
        match fetch_symbol(&client, symbol, args.start, &args.data_dir).await {
            Ok(detail) => report.record_ok(symbol, detail),
            Err(e) => report.record_err(symbol, format!("{:#}", e)),
        }
    }

    report.log_summary();
    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

async fn fetch_symbol(
    client: &MarketDataClient,
    symbol: &str,
    start: NaiveDate,
    data_dir: &PathBuf,
) -> Result<String> {
    let bars = client.fetch_daily_bars(symbol, start).await?;
    if bars.is_empty() {
        anyhow::bail!("no bars returned for {}", symbol);
    }

    let path = csv_store::bars_path(data_dir, symbol);
    csv_store::write_bars(&path, &bars)?;
    info!("Wrote {} bars to {:?}", bars.len(), path);
    Ok(format!("{} bars written to {:?}", bars.len(), path))
}
