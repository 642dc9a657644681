//! JSON artifact describing the latest harness run.
//!
//! One file, overwritten on every run. It is written through
//! [`qg_core::checkpoint::write_atomic`] so a concurrent reader sees either
//! the previous report or the new one.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use qg_core::types::CheckResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::harness::HarnessOutcome;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("report serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Checks declared in configuration.
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Declared but never executed (after a critical failure or setup error).
    pub skipped: usize,
    /// `passed / total` as a percentage, one decimal place.
    pub pass_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub timestamp: DateTime<Utc>,
    pub unit: u64,
    pub summary: ReportSummary,
    pub results: Vec<CheckResult>,
}

impl ReportArtifact {
    pub fn new(unit: u64, outcome: &HarnessOutcome) -> Self {
        let total = outcome.declared;
        let passed = outcome.checks.iter().filter(|c| c.passed()).count();
        let failed = outcome.checks.len() - passed;
        let skipped = total.saturating_sub(outcome.checks.len());

        Self {
            timestamp: Utc::now(),
            unit,
            summary: ReportSummary {
                total,
                passed,
                failed,
                skipped,
                pass_rate: pass_rate(passed, total),
            },
            results: outcome.checks.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_vec_pretty(self)?;
        qg_core::checkpoint::write_atomic(path, &json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read(path: &Path) -> Result<Self, ReportError> {
        let bytes = std::fs::read(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (passed as f64 / total as f64 * 1000.0).round() / 10.0
}
