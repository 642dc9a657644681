use super::client::{GitHubClient, Result};

/// Post a comment on an issue or pull request.
pub async fn create_comment(client: &GitHubClient, number: u64, body: &str) -> Result<()> {
    client
        .octocrab
        .issues(&client.owner, &client.repo)
        .create_comment(number, body)
        .await?;
    Ok(())
}
