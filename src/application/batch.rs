//! Per-symbol outcome aggregation for offline batch jobs.
//!
//! One symbol's failure must not abort the batch: each symbol records a
//! success or a failure with its reason, and the job logs a summary at
//! the end.

use tracing::{info, warn};

#[derive(Debug)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub outcome: Result<String, String>,
}

#[derive(Debug)]
pub struct BatchReport {
    job: String,
    outcomes: Vec<SymbolOutcome>,
}

impl BatchReport {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn record_ok(&mut self, symbol: &str, detail: impl Into<String>) {
        let detail = detail.into();
        info!("{}: {} ok: {}", self.job, symbol, detail);
        self.outcomes.push(SymbolOutcome {
            symbol: symbol.to_string(),
            outcome: Ok(detail),
        });
    }

    pub fn record_err(&mut self, symbol: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("{}: {} failed: {}", self.job, symbol, reason);
        self.outcomes.push(SymbolOutcome {
            symbol: symbol.to_string(),
            outcome: Err(reason),
        });
    }

    pub fn outcomes(&self) -> &[SymbolOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn log_summary(&self) {
        info!(
            "{}: {} succeeded, {} failed out of {} symbols",
            self.job,
            self.succeeded(),
            self.failed(),
            self.outcomes.len()
        );
        for outcome in &self.outcomes {
            if let Err(reason) = &outcome.outcome {
                warn!("{}: {}: {}", self.job, outcome.symbol, reason);
            }
        }
    }
}
