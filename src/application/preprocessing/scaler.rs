//! Min-max feature scaling with persisted, reusable parameters.
//!
//! Parameters are fitted once per symbol at training time, persisted through
//! the [`ModelRegistry`], and reloaded read-only for every later transform and
//! inversion. The predicted feature's column index travels inside the
//! persisted parameters, so the windowing label column and the inversion
//! column always agree.

use crate::application::preprocessing::windows;
use crate::domain::errors::PipelineError;
use crate::domain::market::{DailyBar, canonical_symbol};
use crate::domain::ml::{FEATURE_COUNT, TARGET_FEATURE, bars_to_matrix};
use crate::infrastructure::registry::ModelRegistry;
use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fitted min-max parameters for one symbol.
///
/// Maps each feature column to `[0, 1]` via `(v - min) / (max - min)`.
/// A constant column (max == min) uses a denominator of 1, so it scales to
/// 0.0 and inverts exactly back to its min.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub feature_min: [f64; FEATURE_COUNT],
    pub feature_max: [f64; FEATURE_COUNT],
    /// Column index of the predicted feature.
    pub target: usize,
}

impl ScalerParams {
    /// Fits per-column min/max over the full matrix.
    pub fn fit(matrix: &Array2<f64>) -> Self {
        let mut feature_min = [f64::INFINITY; FEATURE_COUNT];
        let mut feature_max = [f64::NEG_INFINITY; FEATURE_COUNT];

        for row in matrix.rows() {
            for (j, value) in row.iter().enumerate() {
                feature_min[j] = feature_min[j].min(*value);
                feature_max[j] = feature_max[j].max(*value);
            }
        }

        Self {
            feature_min,
            feature_max,
            target: TARGET_FEATURE.index(),
        }
    }

    fn scale_denominator(&self, column: usize) -> f64 {
        let range = self.feature_max[column] - self.feature_min[column];
        if range == 0.0 { 1.0 } else { range }
    }

    /// Applies the fitted affine map column by column.
    pub fn transform(&self, matrix: &Array2<f64>) -> Array2<f64> {
        Array2::from_shape_fn(matrix.raw_dim(), |(i, j)| {
            (matrix[[i, j]] - self.feature_min[j]) / self.scale_denominator(j)
        })
    }

    /// Inverts one full scaled row back to raw feature units.
    pub fn inverse_row(&self, scaled: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut raw = [0.0; FEATURE_COUNT];
        for (j, value) in scaled.iter().enumerate() {
            raw[j] = value * self.scale_denominator(j) + self.feature_min[j];
        }
        raw
    }

    /// Inverts a single scaled prediction back to the target feature's units.
    ///
    /// Builds a zero-filled dummy row, places the value in the target column,
    /// inverts the whole row and reads the target column back out.
    pub fn inverse_target(&self, scaled_value: f64) -> f64 {
        let mut dummy = [0.0; FEATURE_COUNT];
        dummy[self.target] = scaled_value;
        self.inverse_row(&dummy)[self.target]
    }
}

/// Fits, applies and inverts per-symbol scalers, and builds supervised
/// sliding windows out of scaled series.
pub struct WindowScaler {
    registry: Arc<ModelRegistry>,
    look_back: usize,
}

impl WindowScaler {
    pub fn new(registry: Arc<ModelRegistry>, look_back: usize) -> Self {
        Self { registry, look_back }
    }

    pub fn look_back(&self) -> usize {
        self.look_back
    }

    /// Fits a fresh scaler on `bars`, persists it keyed by `symbol` and
    /// returns the scaled feature matrix. Overwrites any previous fit.
    ///
    /// Rejects empty input before touching the registry: fitting on zero rows
    /// would produce non-finite parameters, and persisting those would
    /// destroy any previously good scaler for the symbol.
    pub fn fit_transform(
        &self,
        bars: &[DailyBar],
        symbol: &str,
    ) -> Result<Array2<f64>, PipelineError> {
        let symbol = canonical_symbol(symbol);
        if bars.is_empty() {
            return Err(PipelineError::InsufficientData {
                symbol,
                rows: 0,
                look_back: self.look_back,
            });
        }
        let matrix = bars_to_matrix(bars);
        let params = ScalerParams::fit(&matrix);
        self.registry.save_scaler(&symbol, &params)?;
        Ok(params.transform(&matrix))
    }

    /// Applies the previously persisted scaler for `symbol`. Never refits.
    pub fn transform(&self, bars: &[DailyBar], symbol: &str) -> Result<Array2<f64>, PipelineError> {
        let symbol = canonical_symbol(symbol);
        let params = self.registry.load_scaler(&symbol)?;
        Ok(params.transform(&bars_to_matrix(bars)))
    }

    /// Builds stride-1 sliding windows with next-step target labels.
    /// Produces exactly `T - look_back` windows.
    pub fn make_windows(
        &self,
        matrix: &Array2<f64>,
        symbol: &str,
    ) -> Result<(Array3<f64>, Array1<f64>), PipelineError> {
        windows::make_windows(matrix, self.look_back, TARGET_FEATURE, symbol)
    }

    /// Maps a scaled model output back to a real price for `symbol`.
    pub fn inverse_closing_price(
        &self,
        scaled_value: f64,
        symbol: &str,
    ) -> Result<f64, PipelineError> {
        let symbol = canonical_symbol(symbol);
        let params = self.registry.load_scaler(&symbol)?;
        Ok(params.inverse_target(scaled_value))
    }
}
