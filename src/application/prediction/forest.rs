//! SmartCore random-forest backend, trained in-process by the `train` binary.
//!
//! Windows are flattened row-major to a single feature vector of length
//! `look_back * FEATURE_COUNT`; the same flattening is used at training and
//! inference time.

use super::predictor::PricePredictor;
use anyhow::{Context, Result};
use ndarray::ArrayView2;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

pub type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

pub struct ForestPredictor {
    model: ForestModel,
}

impl ForestPredictor {
    pub fn new(model: ForestModel) -> Self {
        Self { model }
    }

    /// Loads a serialized forest from disk.
    pub fn load(model_path: PathBuf) -> Result<Self> {
        let file = File::open(&model_path)
            .with_context(|| format!("Failed to open model file {:?}", model_path))?;
        let model: ForestModel = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to deserialize model from {:?}", model_path))?;

        info!("Loaded random forest model from {:?}", model_path);
        Ok(Self { model })
    }
}

/// Flattens a `(look_back, features)` window row-major into one sample.
pub fn flatten_window(window: ArrayView2<'_, f64>) -> Vec<f64> {
    window.iter().copied().collect()
}

impl PricePredictor for ForestPredictor {
    fn predict(&self, window: ArrayView2<'_, f64>) -> Result<f64, String> {
        let input_vec = flatten_window(window);
        let input_matrix = match DenseMatrix::from_2d_vec(&vec![input_vec]) {
            Ok(m) => m,
            Err(e) => return Err(format!("Matrix creation failed: {}", e)),
        };

        match self.model.predict(&input_matrix) {
            Ok(predictions) => match predictions.first() {
                Some(pred) => Ok(*pred),
                None => Err("No prediction returned".to_string()),
            },
            Err(e) => Err(format!("Prediction failed: {}", e)),
        }
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use smartcore::ensemble::random_forest_regressor::RandomForestRegressorParameters;

    fn tiny_model(n_features: usize) -> ForestModel {
        // Eight constant-target samples are enough for a fit
        let x: Vec<Vec<f64>> = (0..8)
            .map(|i| (0..n_features).map(|j| (i + j) as f64).collect())
            .collect();
        let y: Vec<f64> = (0..8).map(|i| i as f64 * 0.1).collect();
        let matrix = DenseMatrix::from_2d_vec(&x).unwrap();
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(3)
            .with_max_depth(3)
            .with_min_samples_split(2);
        RandomForestRegressor::fit(&matrix, &y, params).unwrap()
    }

    #[test]
    fn test_flatten_window_is_row_major() {
        let window = Array2::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f64);
        let flat = flatten_window(window.view());
        assert_eq!(flat, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_predict_returns_finite_value() {
        let predictor = ForestPredictor::new(tiny_model(6));
        let window = Array2::from_shape_fn((2, 3), |(i, j)| (i + j) as f64);
        let pred = predictor.predict(window.view()).unwrap();
        assert!(pred.is_finite());
    }

    #[test]
    fn test_load_missing_model_fails() {
        let result = ForestPredictor::load(PathBuf::from("non_existent.json"));
        assert!(result.is_err());
    }
}
