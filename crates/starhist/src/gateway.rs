//! Authorized request gateway.
//!
//! [`AuthorizedTransport`] decorates any [`HttpTransport`] with the
//! cross-cutting concerns the collector itself stays out of: bearer
//! authorization, a `User-Agent`, proactive request pacing, and retry
//! of transport-level failures with exponential backoff. HTTP-level
//! outcomes (403, 304, ...) pass through untouched; classifying those
//! is the collector's job.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// GitHub allows 5000 requests/hour; 10/sec leaves room for short bursts.
pub const DEFAULT_RPS: u32 = 10;

/// Initial backoff delay for transport retries.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum backoff delay for transport retries.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Maximum retries for a single request that failed at the transport level.
pub const MAX_TRANSPORT_RETRIES: usize = 3;

/// A proactive API rate limiter using the governor crate.
///
/// Callers wait on it before each request so the process stays under
/// the remote API's burst limits instead of discovering them via 403s.
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a limiter allowing `requests_per_second` (minimum 1).
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second.max(1)).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Wait until the limiter admits another request.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

/// Retry policy for transport-level failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: usize,
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_TRANSPORT_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Transport wrapper that applies authorization, pacing, and retry.
pub struct AuthorizedTransport {
    inner: Arc<dyn HttpTransport>,
    /// Bearer token; anonymous requests are made when absent.
    token: Option<String>,
    user_agent: String,
    rate_limiter: Option<ApiRateLimiter>,
    retry: RetryConfig,
}

impl AuthorizedTransport {
    pub fn new(inner: Arc<dyn HttpTransport>) -> Self {
        Self {
            inner,
            token: None,
            user_agent: concat!("starhist/", env!("CARGO_PKG_VERSION")).to_string(),
            rate_limiter: Some(ApiRateLimiter::new(DEFAULT_RPS)),
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Option<ApiRateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn apply_headers(&self, request: &mut HttpRequest) {
        request
            .headers
            .push(("User-Agent".to_string(), self.user_agent.clone()));
        if let Some(token) = &self.token {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
    }
}

#[async_trait]
impl HttpTransport for AuthorizedTransport {
    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.apply_headers(&mut request);

        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        let url = request.url.clone();
        let send_op = || {
            let request = request.clone();
            async move { self.inner.send(request).await }
        };

        send_op
            .retry(self.retry.clone().into_backoff())
            .when(|e| matches!(e, HttpError::Transport(_)))
            .notify(move |err, dur| {
                tracing::debug!("transport failure on {url}, retrying in {dur:?}: {err}");
            })
            .await
    }
}
