use octocrab::Octocrab;
use thiserror::Error;

use crate::types::GitHubConfig;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    #[error("missing GitHub token: set {0} in the environment")]
    MissingToken(String),

    #[error("GitHub owner and repo must be configured")]
    MissingRepository,
}

pub type Result<T> = std::result::Result<T, GitHubError>;

#[derive(Debug, Clone)]
pub struct GitHubClient {
    pub(crate) octocrab: Octocrab,
    pub(crate) owner: String,
    pub(crate) repo: String,
}

impl GitHubClient {
    /// Create a new `GitHubClient` from an explicit [`GitHubConfig`].
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let token = config
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GitHubError::MissingToken("GITHUB_TOKEN".into()))?;
        if config.owner.is_empty() || config.repo.is_empty() {
            return Err(GitHubError::MissingRepository);
        }

        let octocrab = Octocrab::builder().personal_token(token).build()?;

        Ok(Self {
            octocrab,
            owner: config.owner,
            repo: config.repo,
        })
    }

    /// Create a client for the configured repository, reading the token from
    /// the environment variable named by `github.token_env`.
    pub fn from_settings(settings: &qg_core::config::GitHubConfig) -> Result<Self> {
        let token = std::env::var(&settings.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GitHubError::MissingToken(settings.token_env.clone()))?;

        Self::new(GitHubConfig {
            token: Some(token),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
        })
    }

    /// Returns a reference to the inner `Octocrab` instance.
    pub fn inner(&self) -> &Octocrab {
        &self.octocrab
    }

    /// Returns the configured owner (org or user).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the configured repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }
}
