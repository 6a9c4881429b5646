//! Cryptocast Server - prediction API
//!
//! Serves next-day price predictions over HTTP using models produced by the
//! offline `fetch_data` / `train` pipeline. Models and scalers are loaded
//! once at startup and treated as read-only afterwards.
//!
//! # Usage
//! ```sh
//! MODELS_DIR=models BIND_ADDR=0.0.0.0:8001 cargo run --bin server
//! ```

use anyhow::Result;
use cryptocast::application::serving::service::PredictionService;
use cryptocast::config::Config;
use cryptocast::infrastructure::registry::ModelRegistry;
use cryptocast::interfaces::http::server::serve;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Cryptocast Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Symbols={:?}, LookBack={}, ModelsDir={:?}",
        config.symbols, config.look_back, config.models_dir
    );

    let registry = Arc::new(ModelRegistry::load_all(&config.models_dir, &config.symbols));
    let available: Vec<&String> = config
        .symbols
        .iter()
        .filter(|s| registry.is_available(s))
        .collect();
    info!(
        "Models loaded for {}/{} symbols: {:?}",
        available.len(),
        config.symbols.len(),
        available
    );

    let service = Arc::new(PredictionService::new(
        config.symbols.clone(),
        config.look_back,
        registry,
    ));

    info!("Server running. Press Ctrl+C to shutdown.");

    tokio::select! {
        result = serve(&config.bind_addr, service) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting...");
            Ok(())
        }
    }
}
