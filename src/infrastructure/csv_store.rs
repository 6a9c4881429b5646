//! Flat-file storage for per-symbol daily OHLCV history.
//!
//! One CSV per symbol at `data_dir/{SYMBOL}_USD.csv`, rows ascending by date.
//! Files are replaced atomically so a concurrent reader never sees a
//! half-written history.

use crate::domain::market::{DailyBar, canonical_symbol};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn bars_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{}_USD.csv", canonical_symbol(symbol)))
}

/// Reads a full per-symbol history file. Accepts both header casings
/// (`Open` and `open`); extra columns are ignored.
pub fn read_bars(path: &Path) -> Result<Vec<DailyBar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open data file {:?}", path))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let bar: DailyBar =
            result.with_context(|| format!("Failed to parse row in {:?}", path))?;
        bars.push(bar);
    }
    Ok(bars)
}

/// Writes a history file with capitalized headers, via atomic replace.
pub fn write_bars(path: &Path, bars: &[DailyBar]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }

    let mut writer = csv::Writer::from_writer(vec![]);
    for bar in bars {
        writer.serialize(bar).context("Failed to serialize bar")?;
    }
    let content = writer
        .into_inner()
        .context("Failed to flush CSV writer")?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).context("Failed to write temp file")?;
    fs::rename(&temp_path, path).context("Failed to rename temp file")?;
    Ok(())
}
