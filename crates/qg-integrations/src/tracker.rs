//! The remote unit-tracking seam.
//!
//! The pipeline only ever talks to the remote side through [`UnitTracker`],
//! so tests can swap in an in-memory tracker.

use async_trait::async_trait;
use qg_core::types::{ChangeUnit, ChangedFile};
use thiserror::Error;

use crate::github::client::GitHubError;
use crate::types::{NewUnit, OpenedUnit};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[async_trait]
pub trait UnitTracker: Send + Sync {
    /// One page of open units, newest first. `page` is 1-based.
    async fn list_open_units(&self, page: u32, per_page: u8) -> Result<Vec<ChangeUnit>>;

    /// Every file the unit touches.
    async fn list_changed_files(&self, number: u64) -> Result<Vec<ChangedFile>>;

    async fn post_comment(&self, number: u64, body: &str) -> Result<()>;

    async fn open_unit(&self, unit: NewUnit) -> Result<OpenedUnit>;
}
