//! Star history collection for GitHub repositories.
//!
//! The library fetches the complete, time-ordered list of star events
//! for a repository through the GitHub REST API: one metadata lookup to
//! size the job, then a bounded concurrent fan-out over the stargazer
//! pages, with conditional requests against an injected cache so repeat
//! runs cost almost nothing.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use starhist::gateway::AuthorizedTransport;
//! use starhist::github::GitHubClient;
//! use starhist::http::ReqwestTransport;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::with_timeout(std::time::Duration::from_secs(30))?;
//! let gateway = AuthorizedTransport::new(Arc::new(transport)).with_token("ghp_...");
//! let client = GitHubClient::new(Arc::new(gateway));
//!
//! let stars = client
//!     .collect_stars("caarlos0/starcharts", &CancellationToken::new(), None)
//!     .await?;
//! println!("{} stars", stars.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod gateway;
pub mod github;
pub mod http;
pub mod metrics;
pub mod progress;

pub use cache::{CachedResponse, MemoryCache, ResponseCache};
pub use github::{CollectOptions, GitHubClient, GitHubError, Repository, Stargazer};
pub use metrics::{AtomicMetrics, MetricsSink, MetricsSnapshot, NoopMetrics};
pub use progress::{CollectProgress, ProgressCallback};
