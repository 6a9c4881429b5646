//! Request routing for the prediction API.
//!
//! Kept free of socket I/O so the route table and error mapping are
//! testable without a running server.

use crate::application::serving::service::PredictionService;
use crate::application::serving::types::{ErrorBody, PredictionInput};
use crate::domain::errors::PipelineError;
use serde::Serialize;

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        Self {
            status,
            body: serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()),
        }
    }

    fn error(status: u16, detail: impl Into<String>) -> Self {
        Self::json(status, &ErrorBody {
            detail: detail.into(),
        })
    }
}

fn pipeline_error_response(err: PipelineError) -> HttpResponse {
    let status = if err.is_client_error() { 400 } else { 500 };
    HttpResponse::error(status, err.to_string())
}

/// Routes one request to the service and renders the response body.
pub fn dispatch(
    service: &PredictionService,
    method: &str,
    path: &str,
    body: &str,
) -> HttpResponse {
    match (method, path) {
        ("POST", "/api/predict") => {
            let request: PredictionInput = match serde_json::from_str(body) {
                Ok(req) => req,
                Err(e) => return HttpResponse::error(400, format!("Invalid request body: {}", e)),
            };
            match service.predict(&request) {
                Ok(output) => HttpResponse::json(200, &output),
                Err(err) => pipeline_error_response(err),
            }
        }
        ("GET", "/api/symbols") => HttpResponse::json(200, &service.symbols()),
        ("GET", "/api/status") => HttpResponse::json(200, &service.status()),
        ("GET", path) if path.starts_with("/api/predictions/detail/") => {
            let id = &path["/api/predictions/detail/".len()..];
            if id.is_empty() {
                return HttpResponse::error(404, "Missing prediction id");
            }
            HttpResponse::json(200, &service.prediction_detail(id))
        }
        _ => HttpResponse::error(404, format!("No route for {} {}", method, path)),
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
