use std::sync::Arc;

use chrono::{DateTime, Utc};
use qg_core::types::ChangeUnit;
use qg_integrations::{TrackerError, UnitTracker};
use tracing::{debug, info};

/// Finds units created strictly after a checkpoint.
pub struct ChangeDetector {
    tracker: Arc<dyn UnitTracker>,
    per_page: u8,
}

impl ChangeDetector {
    pub fn new(tracker: Arc<dyn UnitTracker>, per_page: u8) -> Self {
        Self {
            tracker,
            per_page: per_page.max(1),
        }
    }

    /// Open units with `created_at > since`, newest first.
    ///
    /// Pages are requested newest first; paging stops at the first page that
    /// reaches the checkpoint or comes back short.
    pub async fn detect(&self, since: DateTime<Utc>) -> Result<Vec<ChangeUnit>, TrackerError> {
        let mut found = Vec::new();
        let mut page = 1;

        loop {
            let units = self.tracker.list_open_units(page, self.per_page).await?;
            let fetched = units.len();
            let mut reached_checkpoint = false;

            for unit in units {
                if unit.created_at > since {
                    found.push(unit);
                } else {
                    reached_checkpoint = true;
                }
            }
            debug!(page, fetched, reached_checkpoint, "scanned page of open units");

            if reached_checkpoint || fetched < usize::from(self.per_page) {
                break;
            }
            page += 1;
        }

        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        info!(
            since = %since.to_rfc3339(),
            new_units = found.len(),
            "change detection finished"
        );
        Ok(found)
    }
}
