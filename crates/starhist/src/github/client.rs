//! GitHub API client for star history collection.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::{MemoryCache, ResponseCache};
use crate::http::HttpTransport;
use crate::metrics::{MetricsSink, NoopMetrics};
use crate::progress::ProgressCallback;

use super::error::GitHubError;
use super::stars::Stargazer;

/// Base URL of the GitHub REST API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Stargazers requested per page. 100 is the API maximum.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// GitHub stops serving stargazer pages past this point, so a repo
/// whose computed page count exceeds it cannot be fully listed.
pub const DEFAULT_PAGE_CEILING: u32 = 400;

/// How many page requests may be in flight at once.
pub const DEFAULT_PAGE_FETCH_CONCURRENCY: usize = 4;

/// Tunables for a collection run.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Stargazers per page (1..=100).
    pub page_size: u32,
    /// Refuse to collect repositories needing more pages than this.
    pub page_ceiling: u32,
    /// Concurrent page fetches.
    pub page_concurrency: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_ceiling: DEFAULT_PAGE_CEILING,
            page_concurrency: DEFAULT_PAGE_FETCH_CONCURRENCY,
        }
    }
}

impl CollectOptions {
    /// Clamp fields to usable ranges: the API serves 1..=100 per page,
    /// and the fan-out needs at least one permit.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self.page_concurrency = self.page_concurrency.max(1);
        self
    }
}

/// Client for the GitHub REST API.
///
/// Owns a transport, a response cache, and a metrics sink, all injected
/// so tests can swap in mocks. Cloning is cheap; clones share the same
/// transport and cache.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<dyn ResponseCache>,
    metrics: Arc<dyn MetricsSink>,
    options: CollectOptions,
    api_base: String,
}

impl GitHubClient {
    /// Build a client over `transport` with an in-memory cache and
    /// default options.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cache: Arc::new(MemoryCache::new()),
            metrics: Arc::new(NoopMetrics),
            options: CollectOptions::default(),
            api_base: GITHUB_API_BASE.to_string(),
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: CollectOptions) -> Self {
        self.options = options.normalized();
        self
    }

    /// Point the client at a different API base URL (e.g. GitHub
    /// Enterprise).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub(crate) fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    pub(crate) fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }

    pub(crate) fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    pub(crate) fn options(&self) -> &CollectOptions {
        &self.options
    }

    pub(crate) fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Fetch the complete, time-ordered star history of `name`
    /// (`owner/name`): look up the repository's metadata, then fan out
    /// over its stargazer pages.
    pub async fn collect_stars(
        &self,
        name: &str,
        cancel: &CancellationToken,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Stargazer>, GitHubError> {
        let repo = self.repo_details(name, cancel).await?;
        tracing::info!(
            repo = %repo.full_name,
            stars = repo.stargazers_count,
            "collecting star history"
        );
        self.stargazers(&repo, cancel, on_progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockTransport;

    #[test]
    fn default_options() {
        let options = CollectOptions::default();
        assert_eq!(options.page_size, 100);
        assert_eq!(options.page_ceiling, 400);
        assert_eq!(options.page_concurrency, 4);
    }

    #[test]
    fn with_options_normalizes_degenerate_values() {
        let mock = MockTransport::new();
        let client = GitHubClient::new(Arc::new(mock)).with_options(CollectOptions {
            page_size: 0,
            page_concurrency: 0,
            ..CollectOptions::default()
        });

        assert_eq!(client.options().page_size, 1);
        assert_eq!(client.options().page_concurrency, 1);

        let mock = MockTransport::new();
        let client = GitHubClient::new(Arc::new(mock)).with_options(CollectOptions {
            page_size: 500,
            ..CollectOptions::default()
        });
        assert_eq!(client.options().page_size, 100);
    }

    #[tokio::test]
    async fn zero_page_size_does_not_panic_the_paginator() {
        let mock = MockTransport::new();
        mock.push_json(
            "https://api.github.com/repos/octocat/hello",
            None,
            r#"{"full_name":"octocat/hello","stargazers_count":1,"created_at":"2019-01-01T00:00:00Z"}"#,
        );
        mock.push_json(
            "https://api.github.com/repos/octocat/hello/stargazers?page=1&per_page=1",
            None,
            r#"[{"starred_at":"2020-01-01T00:00:00Z"}]"#,
        );
        mock.push_json(
            "https://api.github.com/repos/octocat/hello/stargazers?page=2&per_page=1",
            None,
            "[]",
        );

        let client = GitHubClient::new(Arc::new(mock.clone())).with_options(CollectOptions {
            page_size: 0,
            ..CollectOptions::default()
        });

        let stars = client
            .collect_stars("octocat/hello", &CancellationToken::new(), None)
            .await
            .expect("degenerate page size falls back to 1");
        assert_eq!(stars.len(), 1);
    }

    #[tokio::test]
    async fn collect_stars_walks_metadata_then_pages() {
        let mock = MockTransport::new();
        mock.push_json(
            "https://api.github.com/repos/octocat/hello",
            Some("\"meta\""),
            r#"{"full_name":"octocat/hello","stargazers_count":2,"created_at":"2019-01-01T00:00:00Z"}"#,
        );
        mock.push_json(
            "https://api.github.com/repos/octocat/hello/stargazers?page=1&per_page=2",
            Some("\"p1\""),
            r#"[{"starred_at":"2020-01-02T00:00:00Z"},{"starred_at":"2020-01-01T00:00:00Z"}]"#,
        );
        mock.push_json(
            "https://api.github.com/repos/octocat/hello/stargazers?page=2&per_page=2",
            Some("\"p2\""),
            "[]",
        );

        let client = GitHubClient::new(Arc::new(mock.clone())).with_options(CollectOptions {
            page_size: 2,
            ..CollectOptions::default()
        });

        let stars = client
            .collect_stars("octocat/hello", &CancellationToken::new(), None)
            .await
            .expect("collection should succeed");

        assert_eq!(stars.len(), 2);
        assert!(stars[0].starred_at <= stars[1].starred_at);
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn collect_stars_propagates_metadata_failure() {
        let mock = MockTransport::new();
        mock.push_status("https://api.github.com/repos/octocat/gone", 404);

        let client = GitHubClient::new(Arc::new(mock.clone()));
        let err = client
            .collect_stars("octocat/gone", &CancellationToken::new(), None)
            .await
            .expect_err("metadata lookup should fail");

        assert!(matches!(err, GitHubError::Api(_)));
        // No page requests after a failed metadata lookup.
        assert_eq!(mock.request_count(), 1);
    }
}
