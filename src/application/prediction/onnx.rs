//! ONNX Runtime backend for sequence models exported from external trainers.

use super::predictor::PricePredictor;
use anyhow::{Context, Result};
use ndarray::ArrayView2;
use ort::session::Session;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

pub struct OnnxPredictor {
    // ort sessions need &mut to run; requests serialize on this lock
    session: Mutex<Session>,
    model_path: PathBuf,
}

impl OnnxPredictor {
    /// Loads a session from an `.onnx` artifact. Fails if the file is missing
    /// or not a valid model; availability policy lives in the registry.
    pub fn load(model_path: PathBuf) -> Result<Self> {
        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {:?}", model_path))?;

        info!("Loaded ONNX model from {:?}", model_path);
        Ok(Self {
            session: Mutex::new(session),
            model_path,
        })
    }

    pub fn model_path(&self) -> &PathBuf {
        &self.model_path
    }
}

impl PricePredictor for OnnxPredictor {
    fn predict(&self, window: ArrayView2<'_, f64>) -> Result<f64, String> {
        let (rows, cols) = window.dim();

        // Batch of one: [1, look_back, features], f32 as exported models expect
        let flat_data: Vec<f32> = window.iter().map(|v| *v as f32).collect();
        let shape = vec![1, rows, cols];

        let input_value = ort::value::Value::from_array((shape.as_slice(), flat_data))
            .map_err(|e| format!("Input value creation failed: {}", e))?;

        let inputs = ort::inputs![input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Session lock failed: {}", e))?;

        match session.run(inputs) {
            Ok(outputs) => {
                let output_value = outputs
                    .iter()
                    .next()
                    .map(|(_, v)| v)
                    .ok_or("No output found")?;
                let data = output_value
                    .try_extract_tensor::<f32>()
                    .map_err(|e| e.to_string())?;
                Ok(*data.1.iter().next().ok_or("Empty output")? as f64)
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn name(&self) -> &str {
        "ONNX Runtime (LSTM)"
    }
}
