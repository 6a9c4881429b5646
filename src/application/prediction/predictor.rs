use ndarray::ArrayView2;

/// Interface for trained price-prediction backends.
///
/// Implementations consume one `(look_back, FEATURE_COUNT)` window of
/// pre-scaled features and return a single scaled next-step prediction.
/// Implementations must be safe to share read-only across request tasks.
pub trait PricePredictor: Send + Sync {
    /// Predict the scaled next-step target value for one window.
    fn predict(&self, window: ArrayView2<'_, f64>) -> Result<f64, String>;

    /// Get model name/type
    fn name(&self) -> &str;
}

impl std::fmt::Debug for dyn PricePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricePredictor")
            .field("name", &self.name())
            .finish()
    }
}
