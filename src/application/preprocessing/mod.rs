pub mod scaler;
pub mod windows;
