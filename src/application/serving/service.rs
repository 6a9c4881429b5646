//! External-facing prediction service: symbol validation, model lookup,
//! inference invocation and result formatting.

use crate::application::serving::types::{
    PredictionDetail, PredictionInput, PredictionOutput, StatusResponse, SymbolsResponse,
};
use crate::domain::errors::PipelineError;
use crate::domain::market::canonical_symbol;
use crate::domain::ml::FEATURE_COUNT;
use crate::infrastructure::registry::ModelRegistry;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub struct PredictionService {
    supported: Vec<String>,
    look_back: usize,
    registry: Arc<ModelRegistry>,
}

impl PredictionService {
    pub fn new(supported: Vec<String>, look_back: usize, registry: Arc<ModelRegistry>) -> Self {
        let supported = supported.iter().map(|s| canonical_symbol(s)).collect();
        Self {
            supported,
            look_back,
            registry,
        }
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    fn validate_symbol(&self, symbol: &str) -> Result<String, PipelineError> {
        let symbol = canonical_symbol(symbol);
        if !self.supported.contains(&symbol) {
            return Err(PipelineError::UnsupportedSymbol {
                symbol,
                supported: self.supported.clone(),
            });
        }
        Ok(symbol)
    }

    /// Runs inference directly on the caller-supplied pre-scaled window.
    ///
    /// This path does not re-run the scaler; the response carries the raw
    /// model output. Correctness depends on the caller scaling its input
    /// with the symbol's persisted parameters (see DESIGN.md).
    pub fn predict(&self, request: &PredictionInput) -> Result<PredictionOutput, PipelineError> {
        let symbol = self.validate_symbol(&request.symbol)?;

        let predictor = self
            .registry
            .model(&symbol)
            .ok_or_else(|| PipelineError::ModelUnavailable {
                symbol: symbol.clone(),
            })?;

        let rows = request.input.len();
        let cols = request.input.first().map(|r| r.len()).unwrap_or(0);
        if rows != self.look_back
            || cols != FEATURE_COUNT
            || request.input.iter().any(|r| r.len() != cols)
        {
            return Err(PipelineError::BadInputShape {
                expected_rows: self.look_back,
                expected_cols: FEATURE_COUNT,
                rows,
                cols,
            });
        }

        let mut window = Array2::<f64>::zeros((rows, cols));
        for (i, row) in request.input.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                window[[i, j]] = *value;
            }
        }

        let scaled = predictor
            .predict(window.view())
            .map_err(|reason| PipelineError::Inference {
                symbol: symbol.clone(),
                reason,
            })?;

        info!("Prediction served for {}: {:.6} (scaled)", symbol, scaled);
        Ok(PredictionOutput {
            symbol,
            prediction: vec![scaled],
        })
    }

    pub fn symbols(&self) -> SymbolsResponse {
        SymbolsResponse {
            symbols: self.supported.clone(),
            available: self
                .supported
                .iter()
                .filter(|s| self.registry.is_available(s))
                .cloned()
                .collect(),
        }
    }

    pub fn status(&self) -> StatusResponse {
        let models: BTreeMap<String, bool> = self
            .supported
            .iter()
            .map(|s| (s.clone(), self.registry.is_available(s)))
            .collect();

        StatusResponse {
            status: "online".to_string(),
            models,
        }
    }

    /// Mock detail lookup, keyed off the id prefix (e.g. "BTC-12345").
    pub fn prediction_detail(&self, prediction_id: &str) -> PredictionDetail {
        let parts: Vec<&str> = prediction_id.split('-').collect();
        let symbol = if parts.len() > 1 && self.supported.contains(&canonical_symbol(parts[0])) {
            canonical_symbol(parts[0])
        } else {
            "BTC".to_string()
        };

        let predicted = if symbol == "BTC" { 85000.0 } else { 4500.0 };

        PredictionDetail {
            id: prediction_id.to_string(),
            symbol,
            date: chrono::Utc::now().date_naive().to_string(),
            predicted,
            actual: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn empty_service() -> (PredictionService, std::path::PathBuf) {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "cryptocast_test_{}_{}_service",
            std::process::id(),
            unique_id
        ));
        fs::create_dir_all(&temp_dir).expect("Failed to create test temp dir");
        let registry = Arc::new(ModelRegistry::new(&temp_dir));
        let supported = ["BTC", "ETH", "XRP", "LTC", "ADA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        (PredictionService::new(supported, 60, registry), temp_dir)
    }

    fn request(symbol: &str, rows: usize, cols: usize) -> PredictionInput {
        PredictionInput {
            symbol: symbol.to_string(),
            input: vec![vec![0.5; cols]; rows],
        }
    }

    #[test]
    fn test_unsupported_symbol_lists_supported_set() {
        let (service, dir) = empty_service();

        let err = service.predict(&request("DOGE", 60, 5)).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedSymbol { .. }));
        let msg = err.to_string();
        assert!(msg.contains("DOGE"));
        assert!(msg.contains("BTC"));
        assert!(msg.contains("ADA"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_supported_symbol_without_model_is_unavailable() {
        let (service, dir) = empty_service();

        let err = service.predict(&request("BTC", 60, 5)).unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("BTC"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_symbol_matching_is_case_insensitive() {
        let (service, dir) = empty_service();

        // "btc" passes symbol validation and fails later, on model lookup
        let err = service.predict(&request("btc", 60, 5)).unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable { .. }));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_symbols_and_status_with_no_models() {
        let (service, dir) = empty_service();

        let symbols = service.symbols();
        assert_eq!(symbols.symbols.len(), 5);
        assert!(symbols.available.is_empty());

        let status = service.status();
        assert_eq!(status.status, "online");
        assert_eq!(status.models.len(), 5);
        assert!(status.models.values().all(|loaded| !loaded));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_prediction_detail_extracts_symbol_from_id() {
        let (service, dir) = empty_service();

        let detail = service.prediction_detail("ETH-42");
        assert_eq!(detail.symbol, "ETH");
        assert_eq!(detail.predicted, 4500.0);
        assert!(detail.actual.is_none());

        // Unknown prefix falls back to BTC
        let detail = service.prediction_detail("SHIB-1");
        assert_eq!(detail.symbol, "BTC");
        assert_eq!(detail.predicted, 85000.0);
        fs::remove_dir_all(dir).ok();
    }
}
