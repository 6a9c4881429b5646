//! Offline prediction path: raw recent bars in, real-unit price out.

use super::predictor::PricePredictor;
use crate::application::preprocessing::scaler::WindowScaler;
use crate::domain::errors::PipelineError;
use crate::domain::market::{DailyBar, canonical_symbol};
use ndarray::{Array3, Axis, s};

/// Turns recent raw history into a model-ready window and a raw model output
/// back into a price, using the symbol's persisted scaler for both directions.
pub struct PredictionPipeline {
    scaler: WindowScaler,
}

impl PredictionPipeline {
    pub fn new(scaler: WindowScaler) -> Self {
        Self { scaler }
    }

    /// Scales `recent_bars` with the persisted scaler and shapes the last
    /// `look_back` rows into a single-sample batch `(1, look_back, features)`.
    pub fn prepare(
        &self,
        recent_bars: &[DailyBar],
        symbol: &str,
    ) -> Result<Array3<f64>, PipelineError> {
        let symbol = canonical_symbol(symbol);
        let look_back = self.scaler.look_back();

        if recent_bars.len() < look_back {
            return Err(PipelineError::InsufficientHistory {
                symbol,
                rows: recent_bars.len(),
                look_back,
            });
        }

        let scaled = self.scaler.transform(recent_bars, &symbol)?;
        let tail = scaled.slice(s![scaled.nrows() - look_back.., ..]);
        let window = tail
            .to_owned()
            .insert_axis(Axis(0));
        Ok(window)
    }

    /// Runs inference on a prepared window and inverse-scales the result
    /// back to the target feature's real units.
    pub fn predict_next(
        &self,
        prepared_window: &Array3<f64>,
        predictor: &dyn PricePredictor,
        symbol: &str,
    ) -> Result<f64, PipelineError> {
        let symbol = canonical_symbol(symbol);
        let window = prepared_window.index_axis(Axis(0), 0);

        let scaled = predictor
            .predict(window)
            .map_err(|reason| PipelineError::Inference {
                symbol: symbol.clone(),
                reason,
            })?;

        self.scaler.inverse_closing_price(scaled, &symbol)
    }
}
