//! GitHub REST API client and the star history collector.

mod client;
mod error;
mod fetch;
mod repo;
mod stars;

pub use client::{
    CollectOptions, DEFAULT_PAGE_CEILING, DEFAULT_PAGE_FETCH_CONCURRENCY, DEFAULT_PAGE_SIZE,
    GITHUB_API_BASE, GitHubClient,
};
pub use error::GitHubError;
pub use repo::Repository;
pub use stars::{PageOutcome, Stargazer};
