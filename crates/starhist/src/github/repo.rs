//! Repository metadata lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::client::GitHubClient;
use super::error::GitHubError;
use super::fetch::{ACCEPT_JSON, FetchOutcome};

/// Repository metadata as returned by `GET /repos/{owner}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/name`.
    pub full_name: String,
    /// Current star count; drives the page fan-out arithmetic.
    pub stargazers_count: u32,
    pub created_at: DateTime<Utc>,
}

impl GitHubClient {
    /// Fetch metadata for the repository `name` (`owner/name`).
    ///
    /// One conditional GET, cached under the repository's full name.
    pub async fn repo_details(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Repository, GitHubError> {
        let url = format!("{}/repos/{}", self.api_base(), name);

        match self
            .fetch_conditional::<Repository>(&url, name, ACCEPT_JSON, cancel)
            .await?
        {
            FetchOutcome::Data(repo) => Ok(repo),
            FetchOutcome::NotModified => Err(GitHubError::Api(format!(
                "no cached metadata for {name} despite 304 response"
            ))),
            FetchOutcome::RateLimited => Err(GitHubError::RateLimited),
            FetchOutcome::ApiError(body) => Err(GitHubError::Api(body)),
        }
    }
}
