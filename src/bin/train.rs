//! Trains one random-forest regressor per symbol on sliding windows of
//! scaled OHLCV history and persists the model + scaler artifacts.
//!
//! One symbol's failure (missing data file, degenerate history) does not
//! abort the batch; the job reports per-symbol outcomes at the end.

use clap::Parser;
use cryptocast::application::batch::BatchReport;
use cryptocast::application::prediction::forest::flatten_window;
use cryptocast::application::preprocessing::scaler::ScalerParams;
use cryptocast::application::preprocessing::windows::{SplitDataset, make_windows, split};
use cryptocast::domain::ml::{TARGET_FEATURE, bars_to_matrix};
use cryptocast::infrastructure::csv_store;
use cryptocast::infrastructure::registry::ModelRegistry;
use ndarray::Array3;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Train per-symbol price prediction models")]
struct Args {
    /// Comma-separated symbols to train
    #[arg(long, default_value = "BTC,ETH,XRP,LTC,ADA")]
    symbols: String,

    /// Directory holding per-symbol CSV history files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Output directory for model and scaler artifacts
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,

    /// Days of history per input window
    #[arg(long, default_value_t = 60)]
    look_back: usize,

    /// Chronological train/validation split fraction
    #[arg(long, default_value_t = 0.8)]
    train_fraction: f64,

    /// Number of trees in the random forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum depth of trees
    #[arg(long, default_value_t = 10)]
    max_depth: u16,

    /// Minimum samples required to split an internal node
    #[arg(long, default_value_t = 5)]
    min_split: usize,
}

fn flatten_windows(x: &Array3<f64>) -> Vec<Vec<f64>> {
    x.outer_iter().map(flatten_window).collect()
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
    let mut report = BatchReport::new("train");

    for symbol in &symbols {
        println!("Training model for {}...", symbol);
        match train_symbol(&args, registry.clone(), symbol) {
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

fn train_symbol(
    args: &Args,
    registry: Arc<ModelRegistry>,
    symbol: &str,
) -> anyhow::Result<String> {
    let data_path = csv_store::bars_path(&args.data_dir, symbol);
    if !data_path.exists() {
        anyhow::bail!("data file {:?} not found, skipping", data_path);
    }

    let bars = csv_store::read_bars(&data_path)?;
    println!("  Loaded {} bars from {:?}", bars.len(), data_path);

    if bars.is_empty() {
        anyhow::bail!("data file {:?} is empty", data_path);
    }

    // Fit the scaler in memory only; both artifacts are written together at
    // the end, after training succeeds. A failed run never replaces the
    // symbol's previous scaler or model.
    let matrix = bars_to_matrix(&bars);
    let scaler_params = ScalerParams::fit(&matrix);
    let scaled = scaler_params.transform(&matrix);
    let (x, y) = make_windows(&scaled, args.look_back, TARGET_FEATURE, symbol)?;
    let dataset = split(&x, &y, args.train_fraction)?;

    let x_train = flatten_windows(&dataset.x_train);
    let y_train: Vec<f64> = dataset.y_train.to_vec();
    println!(
        "  Training Random Forest (samples: {}, trees: {}, depth: {}, min_split: {})...",
        x_train.len(),
        args.n_trees,
        args.max_depth,
        args.min_split
    );

    let x_matrix =
        DenseMatrix::from_2d_vec(&x_train).map_err(|e| anyhow::anyhow!("Matrix error: {}", e))?;
    let params = RandomForestRegressorParameters::default()
        .with_n_trees(args.n_trees)
        .with_max_depth(args.max_depth)
        .with_min_samples_split(args.min_split);
    let model = RandomForestRegressor::fit(&x_matrix, &y_train, params)
        .map_err(|e| anyhow::anyhow!("Training error: {}", e))?;

    evaluate(&model, &dataset, &scaler_params)?;

    registry.save_forest(symbol, &model)?;
    registry.save_scaler(symbol, &scaler_params)?;
    Ok(format!("model saved ({} training windows)", x_train.len()))
}

/// Validation metrics in real price units: predictions and labels are both
/// inverse-transformed before computing RMSE and MAE.
fn evaluate(
    model: &cryptocast::application::prediction::forest::ForestModel,
    dataset: &SplitDataset,
    params: &ScalerParams,
) -> anyhow::Result<()> {
    let n_val = dataset.x_val.shape()[0];
    if n_val == 0 {
        println!("  No validation windows, skipping evaluation.");
        return Ok(());
    }

    let x_val = flatten_windows(&dataset.x_val);
    let x_val_m =
        DenseMatrix::from_2d_vec(&x_val).map_err(|e| anyhow::anyhow!("Matrix error: {}", e))?;
    let predictions: Vec<f64> = model
        .predict(&x_val_m)
        .map_err(|e| anyhow::anyhow!("Predict error: {}", e))?;

    let pred_prices: Vec<f64> = predictions.iter().map(|p| params.inverse_target(*p)).collect();
    let actual_prices: Vec<f64> = dataset
        .y_val
        .iter()
        .map(|y| params.inverse_target(*y))
        .collect();

    let sq_err: f64 = pred_prices
        .iter()
        .zip(actual_prices.iter())
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    let rmse = (sq_err / n_val as f64).sqrt();
    let mae: f64 = pred_prices
        .iter()
        .zip(actual_prices.iter())
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / n_val as f64;

    println!(
        "  Validation (n={}): RMSE={:.4}, MAE={:.4} (price units)",
        n_val, rmse, mae
    );
    Ok(())
}
