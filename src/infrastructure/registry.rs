//! Per-symbol persistence and lookup of trained models and fitted scalers.
//!
//! The registry is the single source of truth mapping symbol to its
//! (model, scaler) artifact pair. It is constructed once at startup, passed
//! around by `Arc`, and never mutated afterwards: artifacts are written only
//! by the offline training job, always via atomic replace.

use crate::application::prediction::forest::{ForestModel, ForestPredictor};
use crate::application::prediction::onnx::OnnxPredictor;
use crate::application::prediction::predictor::PricePredictor;
use crate::application::preprocessing::scaler::ScalerParams;
use crate::domain::errors::PipelineError;
use crate::domain::market::canonical_symbol;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ModelRegistry {
    models_dir: PathBuf,
    models: HashMap<String, Arc<dyn PricePredictor>>,
}

impl ModelRegistry {
    /// A registry with no models loaded; used by offline jobs that only
    /// read and write artifacts.
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            models: HashMap::new(),
        }
    }

    /// Eagerly loads every available model for `symbols`. A symbol whose
    /// artifact is missing or unreadable stays unavailable; startup proceeds.
    pub fn load_all(models_dir: impl Into<PathBuf>, symbols: &[String]) -> Self {
        let mut registry = Self::new(models_dir);

        for symbol in symbols {
            let symbol = canonical_symbol(symbol);
            match registry.load_model(&symbol) {
                Ok(model) => {
                    info!("Model for {} loaded successfully ({})", symbol, model.name());
                    registry.models.insert(symbol, model);
                }
                Err(e) => {
                    warn!("Model for {} not loaded: {}", symbol, e);
                }
            }
        }

        registry
    }

    pub fn scaler_path(&self, symbol: &str) -> PathBuf {
        self.models_dir.join(format!("scaler_{}.json", symbol))
    }

    pub fn onnx_model_path(&self, symbol: &str) -> PathBuf {
        self.models_dir.join(format!("model_{}.onnx", symbol))
    }

    pub fn forest_model_path(&self, symbol: &str) -> PathBuf {
        self.models_dir.join(format!("model_{}.json", symbol))
    }

    /// The model loaded at startup for `symbol`, if any.
    pub fn model(&self, symbol: &str) -> Option<Arc<dyn PricePredictor>> {
        self.models.get(&canonical_symbol(symbol)).cloned()
    }

    pub fn is_available(&self, symbol: &str) -> bool {
        self.models.contains_key(&canonical_symbol(symbol))
    }

    /// Loads a model for `symbol` from disk. An exported ONNX artifact takes
    /// precedence over a serialized random forest for the same symbol.
    pub fn load_model(&self, symbol: &str) -> Result<Arc<dyn PricePredictor>, PipelineError> {
        let symbol = canonical_symbol(symbol);
        let onnx_path = self.onnx_model_path(&symbol);
        let forest_path = self.forest_model_path(&symbol);

        if onnx_path.exists() {
            let predictor =
                OnnxPredictor::load(onnx_path).map_err(|e| PipelineError::Artifact {
                    symbol: symbol.clone(),
                    reason: format!("{:#}", e),
                })?;
            return Ok(Arc::new(predictor));
        }

        if forest_path.exists() {
            let predictor =
                ForestPredictor::load(forest_path).map_err(|e| PipelineError::Artifact {
                    symbol: symbol.clone(),
                    reason: format!("{:#}", e),
                })?;
            return Ok(Arc::new(predictor));
        }

        Err(PipelineError::ModelNotFound {
            symbol,
            path: forest_path,
        })
    }

    /// Persists a trained forest, replacing any previous artifact atomically.
    pub fn save_forest(&self, symbol: &str, model: &ForestModel) -> Result<(), PipelineError> {
        let symbol = canonical_symbol(symbol);
        let content = serde_json::to_vec(model).map_err(|e| PipelineError::Artifact {
            symbol: symbol.clone(),
            reason: format!("Failed to serialize model: {}", e),
        })?;

        write_atomic(&self.forest_model_path(&symbol), &content).map_err(|e| {
            PipelineError::Artifact {
                symbol: symbol.clone(),
                reason: format!("{:#}", e),
            }
        })?;

        info!("Saved model for {} to {:?}", symbol, self.forest_model_path(&symbol));
        Ok(())
    }

    /// Persists fitted scaler parameters, replacing any previous fit atomically.
    pub fn save_scaler(&self, symbol: &str, params: &ScalerParams) -> Result<(), PipelineError> {
        let symbol = canonical_symbol(symbol);
        let content =
            serde_json::to_vec_pretty(params).map_err(|e| PipelineError::Artifact {
                symbol: symbol.clone(),
                reason: format!("Failed to serialize scaler: {}", e),
            })?;

        write_atomic(&self.scaler_path(&symbol), &content).map_err(|e| {
            PipelineError::Artifact {
                symbol: symbol.clone(),
                reason: format!("{:#}", e),
            }
        })
    }

    /// Loads the persisted scaler parameters for `symbol`.
    pub fn load_scaler(&self, symbol: &str) -> Result<ScalerParams, PipelineError> {
        let symbol = canonical_symbol(symbol);
        let path = self.scaler_path(&symbol);

        if !path.exists() {
            return Err(PipelineError::ScalerNotFound { symbol, path });
        }

        let content = fs::read_to_string(&path).map_err(|e| PipelineError::Artifact {
            symbol: symbol.clone(),
            reason: format!("Failed to read scaler file {:?}: {}", path, e),
        })?;
        serde_json::from_str(&content).map_err(|e| PipelineError::Artifact {
            symbol,
            reason: format!("Failed to parse scaler file {:?}: {}", path, e),
        })
    }
}

/// Atomic write: write to a temp file in the same directory, then rename.
/// Readers never observe a partially written artifact.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create artifact directory")?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).context("Failed to write temp file")?;
    fs::rename(&temp_path, path).context("Failed to rename temp file")?;
    Ok(())
}
