use async_trait::async_trait;
use qg_core::types::{ChangeUnit, ChangedFile};
use tracing::debug;

use crate::tracker::{Result, UnitTracker};
use crate::types::{NewUnit, OpenedUnit};

use super::client::GitHubClient;
use super::{issues, pull_requests};

#[async_trait]
impl UnitTracker for GitHubClient {
    async fn list_open_units(&self, page: u32, per_page: u8) -> Result<Vec<ChangeUnit>> {
        let units = pull_requests::list_open_pull_requests(self, page, per_page).await?;
        debug!(page, count = units.len(), "listed open pull requests");
        Ok(units)
    }

    async fn list_changed_files(&self, number: u64) -> Result<Vec<ChangedFile>> {
        Ok(pull_requests::list_pr_files(self, number).await?)
    }

    async fn post_comment(&self, number: u64, body: &str) -> Result<()> {
        Ok(issues::create_comment(self, number, body).await?)
    }

    async fn open_unit(&self, unit: NewUnit) -> Result<OpenedUnit> {
        let opened = pull_requests::create_pull_request(
            self,
            &unit.title,
            &unit.body,
            &unit.head,
            &unit.base,
        )
        .await?;
        Ok(opened)
    }
}
