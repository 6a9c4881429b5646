// Market data domain (daily OHLCV bars)
pub mod market;

// ML feature registry
pub mod ml;

// Domain-specific error types
pub mod errors;
