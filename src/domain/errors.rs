use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the preprocessing, training and prediction pipeline.
///
/// Every variant names the symbol and operation involved so that batch jobs
/// and the serving layer can report failures without extra context.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Symbol {symbol} not supported. Supported symbols: {supported:?}")]
    UnsupportedSymbol {
        symbol: String,
        supported: Vec<String>,
    },

    #[error("Model for {symbol} not loaded")]
    ModelUnavailable { symbol: String },

    #[error("No trained model for {symbol} at {path:?}")]
    ModelNotFound { symbol: String, path: PathBuf },

    #[error("No fitted scaler for {symbol} at {path:?}")]
    ScalerNotFound { symbol: String, path: PathBuf },

    #[error("Cannot build windows for {symbol}: {rows} rows, need more than look-back {look_back}")]
    InsufficientData {
        symbol: String,
        rows: usize,
        look_back: usize,
    },

    #[error("Cannot prepare prediction for {symbol}: {rows} rows of history, need at least {look_back}")]
    InsufficientHistory {
        symbol: String,
        rows: usize,
        look_back: usize,
    },

    #[error("Train fraction must be strictly between 0 and 1, got {fraction}")]
    InvalidFraction { fraction: f64 },

    #[error("Input window must be {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    BadInputShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Inference failed for {symbol}: {reason}")]
    Inference { symbol: String, reason: String },

    #[error("Artifact error for {symbol}: {reason}")]
    Artifact { symbol: String, reason: String },
}

impl PipelineError {
    /// True for errors caused by the caller's request rather than server state.
    /// The HTTP layer maps these to 400, everything else to 500.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedSymbol { .. } | PipelineError::BadInputShape { .. }
        )
    }
}
