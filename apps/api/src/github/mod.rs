//! GitHub client — the single point of entry for all GitHub API calls.
//!
//! Read-only: two endpoints, the user record and the public repository
//! list. Callers treat failures as degradable (the aggregator backfills
//! nulls, the classifier returns an empty list); this module just reports
//! them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("portfolio-api/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub avatar_url: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    #[serde(default)]
    pub public_repos: i64,
    #[serde(default)]
    pub followers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub homepage: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

fn default_visibility() -> String {
    "public".to_string()
}

/// The GitHub client shared by the aggregator and the project classifier.
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    base: String,
    handle: String,
}

impl GithubClient {
    pub fn new(base: String, handle: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            base,
            handle,
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Fetches the configured user's public profile record.
    pub async fn fetch_user(&self) -> Result<GithubUser, GithubError> {
        let url = format!("{}/users/{}", self.base, self.handle);
        debug!("GET {url}");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GithubError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Fetches the configured user's public repositories, unfiltered.
    /// Filtering and ordering belong to the classifier.
    pub async fn fetch_repositories(&self) -> Result<Vec<GithubRepo>, GithubError> {
        let url = format!(
            "{}/users/{}/repos?sort=updated&per_page=100&type=public",
            self.base, self.handle
        );
        debug!("GET {url}");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GithubError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
