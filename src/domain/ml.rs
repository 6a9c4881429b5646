//! Feature registry for the price-prediction models.

use crate::domain::market::DailyBar;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Number of input features per daily bar.
pub const FEATURE_COUNT: usize = 5;

/// The five OHLCV features, in the fixed order used everywhere downstream.
///
/// This order MUST match the column order of the scaled feature matrix, the
/// persisted scaler parameters, and any exported model's input layout.
/// Any change here is a breaking change for trained models and saved scalers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feature {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Feature {
    pub const ORDER: [Feature; FEATURE_COUNT] = [
        Feature::Open,
        Feature::High,
        Feature::Low,
        Feature::Close,
        Feature::Volume,
    ];

    /// Column index of this feature in the scaled matrix.
    pub fn index(self) -> usize {
        match self {
            Feature::Open => 0,
            Feature::High => 1,
            Feature::Low => 2,
            Feature::Close => 3,
            Feature::Volume => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Feature::Open => "open",
            Feature::High => "high",
            Feature::Low => "low",
            Feature::Close => "close",
            Feature::Volume => "volume",
        }
    }
}

/// The feature whose next-day value the models predict.
pub const TARGET_FEATURE: Feature = Feature::Close;

/// Converts one bar into its feature vector, in `Feature::ORDER`.
pub fn bar_to_features(bar: &DailyBar) -> [f64; FEATURE_COUNT] {
    [bar.open, bar.high, bar.low, bar.close, bar.volume]
}

/// Stacks bars into a `(T, FEATURE_COUNT)` matrix, preserving row order.
pub fn bars_to_matrix(bars: &[DailyBar]) -> Array2<f64> {
    let mut matrix = Array2::<f64>::zeros((bars.len(), FEATURE_COUNT));
    for (i, bar) in bars.iter().enumerate() {
        let features = bar_to_features(bar);
        for (j, value) in features.iter().enumerate() {
            matrix[[i, j]] = *value;
        }
    }
    matrix
}
