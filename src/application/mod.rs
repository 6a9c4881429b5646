// Per-symbol batch reporting for offline jobs
pub mod batch;

// Inference backends and the prediction pipeline
pub mod prediction;

// Scaling and windowing of raw OHLCV series
pub mod preprocessing;

// External-facing prediction service
pub mod serving;
