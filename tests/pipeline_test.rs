//! End-to-end pipeline scenarios: fit → window → split → train → predict,
//! plus the serving-path contracts.

use chrono::NaiveDate;
use cryptocast::application::prediction::forest::{ForestPredictor, flatten_window};
use cryptocast::application::prediction::pipeline::PredictionPipeline;
use cryptocast::application::preprocessing::scaler::WindowScaler;
use cryptocast::application::preprocessing::windows::split;
use cryptocast::application::serving::service::PredictionService;
use cryptocast::application::serving::types::PredictionInput;
use cryptocast::domain::errors::PipelineError;
use cryptocast::domain::market::DailyBar;
use cryptocast::infrastructure::registry::ModelRegistry;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir(tag: &str) -> PathBuf {
    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "cryptocast_it_{}_{}_{}",
        std::process::id(),
        unique_id,
        tag
    ));
    fs::create_dir_all(&dir).expect("Failed to create test temp dir");
    dir
}

/// Synthetic linearly increasing daily prices.
fn linear_history(days: usize) -> Vec<DailyBar> {
    (0..days)
        .map(|i| {
            let base = 1000.0 + i as f64 * 5.0;
            DailyBar {
                date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: base,
                high: base + 10.0,
                low: base - 10.0,
                close: base + 2.0,
                volume: 5000.0 + i as f64 * 3.0,
            }
        })
        .collect()
}

#[test]
fn sixty_five_days_yield_five_windows_and_a_bounded_prediction() {
    let dir = test_dir("linear");
    let registry = Arc::new(ModelRegistry::new(&dir));
    let look_back = 60;
    let history = linear_history(65);

    let scaler = WindowScaler::new(registry.clone(), look_back);
    let matrix = scaler.fit_transform(&history, "BTC").unwrap();
    let (x, y) = scaler.make_windows(&matrix, "BTC").unwrap();
    assert_eq!(x.shape()[0], 5);
    assert_eq!(y.len(), 5);

    // 5 windows at fraction 0.8 -> 4 training, 1 validation
    let dataset = split(&x, &y, 0.8).unwrap();
    assert_eq!(dataset.x_train.shape()[0], 4);
    assert_eq!(dataset.x_val.shape()[0], 1);

    // Train a small forest on the training windows and persist it
    let x_train: Vec<Vec<f64>> = dataset
        .x_train
        .outer_iter()
        .map(flatten_window)
        .collect();
    let y_train = dataset.y_train.to_vec();
    let params = RandomForestRegressorParameters::default()
        .with_n_trees(5)
        .with_max_depth(4)
        .with_min_samples_split(2);
    let model = RandomForestRegressor::fit(
        &DenseMatrix::from_2d_vec(&x_train).unwrap(),
        &y_train,
        params,
    )
    .unwrap();
    registry.save_forest("BTC", &model).unwrap();

    // Predict off the most recent window and invert to price units
    let predictor = registry.load_model("BTC").unwrap();
    let pipeline = PredictionPipeline::new(WindowScaler::new(registry.clone(), look_back));
    let window = pipeline.prepare(&history, "BTC").unwrap();
    let price = pipeline
        .predict_next(&window, predictor.as_ref(), "BTC")
        .unwrap();

    let min_close = history.iter().map(|b| b.close).fold(f64::INFINITY, f64::min);
    let max_close = history
        .iter()
        .map(|b| b.close)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(
        price >= min_close && price <= max_close,
        "prediction {} outside [{}, {}]",
        price,
        min_close,
        max_close
    );

    fs::remove_dir_all(dir).ok();
}

#[test]
fn trained_artifacts_survive_a_registry_restart() {
    let dir = test_dir("restart");
    let look_back = 10;
    let history = linear_history(40);

    // "Training process"
    {
        let registry = Arc::new(ModelRegistry::new(&dir));
        let scaler = WindowScaler::new(registry.clone(), look_back);
        let matrix = scaler.fit_transform(&history, "ETH").unwrap();
        let (x, y) = scaler.make_windows(&matrix, "ETH").unwrap();
        let dataset = split(&x, &y, 0.8).unwrap();

        let x_train: Vec<Vec<f64>> = dataset.x_train.outer_iter().map(flatten_window).collect();
        let model = RandomForestRegressor::fit(
            &DenseMatrix::from_2d_vec(&x_train).unwrap(),
            &dataset.y_train.to_vec(),
            RandomForestRegressorParameters::default()
                .with_n_trees(3)
                .with_max_depth(3)
                .with_min_samples_split(2),
        )
        .unwrap();
        registry.save_forest("ETH", &model).unwrap();
    }

    // "Serving process": fresh registry, eager startup load
    let registry = Arc::new(ModelRegistry::load_all(&dir, &["ETH".to_string()]));
    assert!(registry.is_available("ETH"));

    let pipeline = PredictionPipeline::new(WindowScaler::new(registry.clone(), look_back));
    let window = pipeline.prepare(&history, "ETH").unwrap();
    let predictor = registry.model("ETH").unwrap();
    let price = pipeline
        .predict_next(&window, predictor.as_ref(), "ETH")
        .unwrap();
    assert!(price.is_finite());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn serving_contract_rejects_unsupported_and_unready_symbols() {
    let dir = test_dir("serving");
    let registry = Arc::new(ModelRegistry::new(&dir));
    let supported = ["BTC", "ETH", "XRP", "LTC", "ADA"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let service = PredictionService::new(supported, 60, registry);

    // DOGE is not in the supported set
    let err = service
        .predict(&PredictionInput {
            symbol: "DOGE".to_string(),
            input: vec![vec![0.5; 5]; 60],
        })
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedSymbol { .. }));
    assert!(err.to_string().contains("DOGE"));
    assert!(err.to_string().contains("BTC"));

    // BTC is supported but no model has been trained yet: an error, not a crash
    let err = service
        .predict(&PredictionInput {
            symbol: "BTC".to_string(),
            input: vec![vec![0.5; 5]; 60],
        })
        .unwrap_err();
    assert!(matches!(err, PipelineError::ModelUnavailable { .. }));

    fs::remove_dir_all(dir).ok();
}

#[test]
fn serving_path_runs_inference_on_pre_scaled_input() {
    let dir = test_dir("serve_ok");
    let look_back = 10;
    let history = linear_history(40);

    let registry = Arc::new(ModelRegistry::new(&dir));
    let scaler = WindowScaler::new(registry.clone(), look_back);
    let matrix = scaler.fit_transform(&history, "BTC").unwrap();
    let (x, y) = scaler.make_windows(&matrix, "BTC").unwrap();
    let dataset = split(&x, &y, 0.8).unwrap();
    let x_train: Vec<Vec<f64>> = dataset.x_train.outer_iter().map(flatten_window).collect();
    let model = RandomForestRegressor::fit(
        &DenseMatrix::from_2d_vec(&x_train).unwrap(),
        &dataset.y_train.to_vec(),
        RandomForestRegressorParameters::default()
            .with_n_trees(3)
            .with_max_depth(3)
            .with_min_samples_split(2),
    )
    .unwrap();
    registry.save_forest("BTC", &model).unwrap();

    let registry = Arc::new(ModelRegistry::load_all(&dir, &["BTC".to_string()]));
    let service = PredictionService::new(vec!["BTC".to_string()], look_back, registry.clone());

    // Caller pre-scales its window exactly as training did
    let scaled = scaler.transform(&history, "BTC").unwrap();
    let start = scaled.nrows() - look_back;
    let input: Vec<Vec<f64>> = (start..scaled.nrows())
        .map(|i| (0..5).map(|j| scaled[[i, j]]).collect())
        .collect();

    let output = service
        .predict(&PredictionInput {
            symbol: "BTC".to_string(),
            input,
        })
        .unwrap();
    assert_eq!(output.symbol, "BTC");
    assert_eq!(output.prediction.len(), 1);

    // Raw model output in scaled units; invertible via the persisted scaler
    let scaled_pred = output.prediction[0];
    let price = registry
        .load_scaler("BTC")
        .unwrap()
        .inverse_target(scaled_pred);
    assert!(price.is_finite());

    // Wrong shape is rejected before inference
    let err = service
        .predict(&PredictionInput {
            symbol: "BTC".to_string(),
            input: vec![vec![0.5; 5]; look_back - 1],
        })
        .unwrap_err();
    assert!(matches!(err, PipelineError::BadInputShape { .. }));

    fs::remove_dir_all(dir).ok();
}

#[test]
fn forest_predictor_loads_from_disk_and_matches_in_memory_model() {
    let dir = test_dir("load");
    let look_back = 5;
    let history = linear_history(30);

    let registry = Arc::new(ModelRegistry::new(&dir));
    let scaler = WindowScaler::new(registry.clone(), look_back);
    let matrix = scaler.fit_transform(&history, "XRP").unwrap();
    let (x, y) = scaler.make_windows(&matrix, "XRP").unwrap();

    let x_flat: Vec<Vec<f64>> = x.outer_iter().map(flatten_window).collect();
    let model = RandomForestRegressor::fit(
        &DenseMatrix::from_2d_vec(&x_flat).unwrap(),
        &y.to_vec(),
        RandomForestRegressorParameters::default()
            .with_n_trees(3)
            .with_max_depth(3)
            .with_min_samples_split(2),
    )
    .unwrap();
    registry.save_forest("XRP", &model).unwrap();

    use cryptocast::application::prediction::predictor::PricePredictor;
    let loaded = ForestPredictor::load(registry.forest_model_path("XRP")).unwrap();

    let last_window = x.index_axis(ndarray::Axis(0), x.shape()[0] - 1);
    let direct = model
        .predict(&DenseMatrix::from_2d_vec(&vec![flatten_window(last_window)]).unwrap())
        .unwrap()[0];
    let via_loaded = loaded.predict(last_window).unwrap();
    assert!((direct - via_loaded).abs() < 1e-12);

    fs::remove_dir_all(dir).ok();
}
