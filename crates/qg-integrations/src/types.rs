use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub owner: String,
    pub repo: String,
}

/// Request to open a new change unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUnit {
    pub title: String,
    /// Branch carrying the proposed commits.
    pub head: String,
    /// Branch the unit targets.
    pub base: String,
    pub body: String,
}

/// A unit the tracker accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedUnit {
    pub number: u64,
    pub html_url: String,
}
