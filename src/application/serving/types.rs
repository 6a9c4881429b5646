//! Wire types for the prediction API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `POST /api/predict` request body. `input` is a pre-scaled
/// `(look_back, 5)` window; the caller is responsible for scaling it with
/// the same parameters the symbol's model was trained with.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionInput {
    pub symbol: String,
    pub input: Vec<Vec<f64>>,
}

/// `POST /api/predict` response body. `prediction` carries the raw model
/// output (scaled units, batch of one).
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutput {
    pub symbol: String,
    pub prediction: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolsResponse {
    pub symbols: Vec<String>,
    pub available: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub models: BTreeMap<String, bool>,
}

/// `GET /api/predictions/detail/{id}` response. Mock lookup only; a real
/// deployment would back this with a database.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionDetail {
    pub id: String,
    pub symbol: String,
    pub date: String,
    pub predicted: f64,
    pub actual: Option<f64>,
}

/// Error body shape shared by all endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}
