use octocrab::params;
use qg_core::types::{ChangeUnit, ChangedFile};

use crate::types::OpenedUnit;

use super::client::{GitHubClient, Result};

/// List open pull requests, newest first.
pub async fn list_open_pull_requests(
    client: &GitHubClient,
    page: u32,
    per_page: u8,
) -> Result<Vec<ChangeUnit>> {
    let pulls_handler = client.octocrab.pulls(&client.owner, &client.repo);

    let page = pulls_handler
        .list()
        .state(params::State::Open)
        .sort(params::pulls::Sort::Created)
        .direction(params::Direction::Descending)
        .page(page)
        .per_page(per_page)
        .send()
        .await?;

    Ok(page.items.into_iter().map(octocrab_pr_to_unit).collect())
}

/// Create a new pull request.
pub async fn create_pull_request(
    client: &GitHubClient,
    title: &str,
    body: &str,
    head: &str,
    base: &str,
) -> Result<OpenedUnit> {
    let pulls_handler = client.octocrab.pulls(&client.owner, &client.repo);

    let pr = pulls_handler
        .create(title, head, base)
        .body(body)
        .send()
        .await?;

    Ok(OpenedUnit {
        number: pr.number,
        html_url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
    })
}

/// List every file changed in a pull request, following pagination.
pub async fn list_pr_files(client: &GitHubClient, number: u64) -> Result<Vec<ChangedFile>> {
    let first = client
        .octocrab
        .pulls(&client.owner, &client.repo)
        .list_files(number)
        .await?;
    let files = client.octocrab.all_pages(first).await?;

    let result = files
        .into_iter()
        .map(|f| ChangedFile {
            path: f.filename,
            status: format!("{:?}", f.status).to_lowercase(),
            additions: f.additions,
            deletions: f.deletions,
        })
        .collect();

    Ok(result)
}

// ---- internal helpers -------------------------------------------------------

fn octocrab_pr_to_unit(pr: octocrab::models::pulls::PullRequest) -> ChangeUnit {
    let author = pr
        .user
        .as_ref()
        .map(|u| u.login.clone())
        .unwrap_or_default();

    ChangeUnit {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        source_branch: pr.head.ref_field.clone(),
        base_branch: pr.base.ref_field.clone(),
        author,
        created_at: pr.created_at.unwrap_or_else(chrono::Utc::now),
        html_url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
    }
}
