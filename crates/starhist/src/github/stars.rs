//! Stargazer pages and the bounded concurrent paginator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::progress::{CollectProgress, ProgressCallback, emit};

use super::client::GitHubClient;
use super::error::GitHubError;
use super::fetch::FetchOutcome;
use super::repo::Repository;

/// Media type that makes the stargazer endpoint include `starred_at`
/// timestamps instead of bare user objects.
const ACCEPT_STAR_JSON: &str = "application/vnd.github.v3.star+json";

/// A single star event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stargazer {
    /// When the star was given.
    pub starred_at: DateTime<Utc>,
}

/// Outcome of fetching one stargazer page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Star events, fresh from the API or replayed from cache.
    Fresh(Vec<Stargazer>),
    /// A 304 the cache could not answer even after the unconditional
    /// retry. Folded as a no-op rather than failing the collection.
    NotModified,
    /// The page is past the last page with data. This, not arithmetic,
    /// is the authoritative end-of-history signal.
    Exhausted,
    /// The API answered 403 for this page.
    RateLimited,
    /// Any other unexpected status, with the body as diagnostic text.
    ApiError(String),
}

impl GitHubClient {
    /// Number of full pages implied by the current star count.
    pub(crate) fn total_pages(&self, repo: &Repository) -> u32 {
        repo.stargazers_count / self.options().page_size
    }

    /// One page past the arithmetic count, to pick up the remainder.
    pub(crate) fn last_page(&self, repo: &Repository) -> u32 {
        self.total_pages(repo) + 1
    }

    /// Fetch one 1-indexed page of star events for `repo`.
    pub async fn stargazers_page(
        &self,
        repo: &Repository,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<PageOutcome, GitHubError> {
        let url = format!(
            "{}/repos/{}/stargazers?page={}&per_page={}",
            self.api_base(),
            repo.full_name,
            page,
            self.options().page_size,
        );
        let key = format!("{}_{}", repo.full_name, page);

        let outcome = match self
            .fetch_conditional::<Vec<Stargazer>>(&url, &key, ACCEPT_STAR_JSON, cancel)
            .await?
        {
            FetchOutcome::Data(stars) if stars.is_empty() => PageOutcome::Exhausted,
            FetchOutcome::Data(stars) => PageOutcome::Fresh(stars),
            FetchOutcome::NotModified => PageOutcome::NotModified,
            FetchOutcome::RateLimited => PageOutcome::RateLimited,
            FetchOutcome::ApiError(body) => PageOutcome::ApiError(body),
        };
        Ok(outcome)
    }

    /// Collect the complete star history of `repo`, ascending by
    /// `starred_at`.
    ///
    /// Pages 1 through [`last_page`](Self::last_page) are fetched with
    /// at most `page_concurrency` requests in flight. Any page failing
    /// fails the whole collection; the first failure wins and partial
    /// data is discarded. If the page count exceeds the ceiling the
    /// collection fails before a single request goes out.
    pub async fn stargazers(
        &self,
        repo: &Repository,
        cancel: &CancellationToken,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Vec<Stargazer>, GitHubError> {
        let total_pages = self.total_pages(repo);
        if total_pages > self.options().page_ceiling {
            return Err(GitHubError::TooManyStars { pages: total_pages });
        }
        let last_page = self.last_page(repo);

        tracing::debug!(
            repo = %repo.full_name,
            pages = last_page,
            concurrency = self.options().page_concurrency,
            "fetching stargazer pages"
        );
        emit(
            on_progress,
            CollectProgress::FetchingPages {
                repo: repo.full_name.clone(),
                expected_pages: last_page,
            },
        );

        // Every page task reports through the channel and this function
        // is the only owner of the accumulator, so no lock is needed.
        let semaphore = Arc::new(Semaphore::new(self.options().page_concurrency));
        let (tx, mut rx) = mpsc::channel::<(u32, Result<PageOutcome, GitHubError>)>(
            last_page.max(1) as usize,
        );

        for page in 1..=last_page {
            let client = self.clone();
            let repo = repo.clone();
            let cancel = cancel.clone();
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                let result = client.stargazers_page(&repo, page, &cancel).await;
                let _ = tx.send((page, result)).await;
            });
        }
        drop(tx);

        let mut stars: Vec<Stargazer> = Vec::new();
        let mut first_err: Option<GitHubError> = None;

        while let Some((page, result)) = rx.recv().await {
            match result {
                Ok(PageOutcome::Fresh(events)) => {
                    if first_err.is_none() {
                        let count = events.len();
                        stars.extend(events);
                        emit(
                            on_progress,
                            CollectProgress::FetchedPage {
                                repo: repo.full_name.clone(),
                                page,
                                count,
                                total_so_far: stars.len(),
                            },
                        );
                    }
                }
                Ok(PageOutcome::Exhausted) => {
                    tracing::debug!(repo = %repo.full_name, page, "page is empty");
                }
                Ok(PageOutcome::NotModified) => {}
                Ok(PageOutcome::RateLimited) => {
                    first_err.get_or_insert(GitHubError::RateLimited);
                }
                Ok(PageOutcome::ApiError(body)) => {
                    first_err.get_or_insert(GitHubError::Api(body));
                }
                Err(err) => {
                    first_err.get_or_insert(err);
                }
            }
        }

        if let Some(err) = first_err {
            return Err(err);
        }

        // Pages land out of order; a stable sort keeps within-page order
        // for equal timestamps.
        stars.sort_by_key(|s| s.starred_at);

        emit(
            on_progress,
            CollectProgress::Complete {
                repo: repo.full_name.clone(),
                total: stars.len(),
            },
        );
        Ok(stars)
    }
}
