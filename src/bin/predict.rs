//! Produces next-day price predictions for every configured symbol using
//! the persisted model + scaler artifacts, and writes them to a JSON file.

use chrono::Utc;
use clap::Parser;
use cryptocast::application::batch::BatchReport;
use cryptocast::application::prediction::pipeline::PredictionPipeline;
use cryptocast::application::preprocessing::scaler::WindowScaler;
use cryptocast::infrastructure::csv_store;
use cryptocast::infrastructure::registry::ModelRegistry;
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Predict next-day prices for trained symbols")]
struct Args {
    /// Comma-separated symbols to predict
    #[arg(long, default_value = "BTC,ETH,XRP,LTC,ADA")]
    symbols: String,

    /// Directory holding per-symbol CSV history files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory holding model and scaler artifacts
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,

    /// Output directory for the predictions file
    #[arg(long, default_value = "predictions")]
    predictions_dir: PathBuf,

    /// Days of history per input window
    #[arg(long, default_value_t = 60)]
    look_back: usize,

    /// Most recent days of history to feed the pipeline
    #[arg(long, default_value_t = 100)]
    history: usize,
}

#[derive(Debug, Serialize)]
struct PredictionRecord {
    symbol: String,
    predicted_price: f64,
    date: String,
}

fn main() -> Result<(), Box<dyn Error>> {
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

    let registry = Arc::new(ModelRegistry::new(&args.models_dir));
    let pipeline = PredictionPipeline::new(WindowScaler::new(registry.clone(), args.look_back));

    let mut report = BatchReport::new("predict");
    let mut predictions: Vec<PredictionRecord> = Vec::new();

    for symbol in &symbols {
        match predict_symbol(&args, &registry, &pipeline, symbol) {
            Ok(record) => {
                report.record_ok(
                    symbol,
                    format!("predicted price {:.2}", record.predicted_price),
                );
                predictions.push(record);
            }
            Err(e) => report.record_err(symbol, format!("{:#}", e)),
        }
    }

    write_predictions(&args.predictions_dir, &predictions)?;
    report.log_summary();
    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

fn predict_symbol(
    args: &Args,
    registry: &Arc<ModelRegistry>,
    pipeline: &PredictionPipeline,
    symbol: &str,
) -> anyhow::Result<PredictionRecord> {
    let data_path = csv_store::bars_path(&args.data_dir, symbol);
    let bars = csv_store::read_bars(&data_path)?;

    // Use the most recent days only
    let recent = if bars.len() > args.history {
        &bars[bars.len() - args.history..]
    } else {
        &bars[..]
    };

    let predictor = registry.load_model(symbol)?;
    let window = pipeline.prepare(recent, symbol)?;
    let price = pipeline.predict_next(&window, predictor.as_ref(), symbol)?;

    Ok(PredictionRecord {
        symbol: symbol.to_string(),
        predicted_price: price,
        date: Utc::now().date_naive().to_string(),
    })
}

fn write_predictions(dir: &PathBuf, predictions: &[PredictionRecord]) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join("latest_predictions.json");
    let content = serde_json::to_string_pretty(predictions)?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, &path)?;

    info!("{} predictions saved to {:?}", predictions.len(), path);
    Ok(())
}
