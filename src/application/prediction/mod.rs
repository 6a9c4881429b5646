pub mod forest;
pub mod onnx;
pub mod pipeline;
pub mod predictor;
