//! Sliding-window dataset construction and chronological splitting.

use crate::domain::errors::PipelineError;
use crate::domain::ml::Feature;
use ndarray::{Array1, Array2, Array3, s};

/// Builds supervised (X, y) pairs out of a scaled feature matrix.
///
/// `X[i]` is rows `i..i+look_back`, `y[i]` is the target column of row
/// `i + look_back`. A single forward scan with stride 1 yields exactly
/// `T - look_back` windows.
pub fn make_windows(
    matrix: &Array2<f64>,
    look_back: usize,
    target: Feature,
    symbol: &str,
) -> Result<(Array3<f64>, Array1<f64>), PipelineError> {
    let rows = matrix.nrows();
    if rows <= look_back {
        return Err(PipelineError::InsufficientData {
            symbol: symbol.to_string(),
            rows,
            look_back,
        });
    }

    let n_windows = rows - look_back;
    let n_features = matrix.ncols();

    let x = Array3::from_shape_fn((n_windows, look_back, n_features), |(i, j, k)| {
        matrix[[i + j, k]]
    });
    let y = Array1::from_shape_fn(n_windows, |i| matrix[[i + look_back, target.index()]]);

    Ok((x, y))
}

/// Chronologically split windowed data.
#[derive(Debug)]
pub struct SplitDataset {
    pub x_train: Array3<f64>,
    pub x_val: Array3<f64>,
    pub y_train: Array1<f64>,
    pub y_val: Array1<f64>,
}

/// Splits at index `floor(N * fraction)`; training windows strictly precede
/// validation windows in original order. Financial time series must not be
/// shuffled, so there is no randomization anywhere in this path.
pub fn split(
    x: &Array3<f64>,
    y: &Array1<f64>,
    fraction: f64,
) -> Result<SplitDataset, PipelineError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(PipelineError::InvalidFraction { fraction });
    }

    let n = x.shape()[0];
    let split_idx = (n as f64 * fraction).floor() as usize;

    Ok(SplitDataset {
        x_train: x.slice(s![..split_idx, .., ..]).to_owned(),
        x_val: x.slice(s![split_idx.., .., ..]).to_owned(),
        y_train: y.slice(s![..split_idx]).to_owned(),
        y_val: y.slice(s![split_idx..]).to_owned(),
    })
}
