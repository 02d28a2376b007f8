//! Conditional GET plumbing shared by the metadata and page fetchers.
//!
//! Both fetchers follow the same cache discipline: send the stored ETag
//! as `If-None-Match` and serve a 304 from the cached body. When a 304
//! arrives with nothing behind it, invalidate the token and make
//! exactly one unconditional re-fetch. The retry budget is an explicit
//! constant so the single-retry limit is testable.

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::cache::CachedResponse;
use crate::http::{HttpRequest, HttpResponse};

use super::client::GitHubClient;
use super::error::GitHubError;

/// How many times a conditional fetch may heal itself after a 304 that
/// the cache cannot answer.
pub(crate) const MAX_CONDITIONAL_RETRIES: u32 = 1;

/// Media type for endpoints that only need plain JSON.
pub(crate) const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Classified result of one conditional GET.
#[derive(Debug)]
pub(crate) enum FetchOutcome<T> {
    /// Decoded payload, fresh from the API or replayed from cache.
    Data(T),
    /// 304 that the cache could not answer even after the unconditional
    /// re-fetch. Effectively unreachable against a well-behaved server.
    NotModified,
    /// HTTP 403.
    RateLimited,
    /// Any other non-2xx/304 status, with the body as diagnostic text.
    ApiError(String),
}

impl GitHubClient {
    /// Send one GET, racing it against cancellation.
    pub(crate) async fn send_get(
        &self,
        url: &str,
        etag: Option<&str>,
        accept: &str,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, GitHubError> {
        let mut headers = vec![("Accept".to_string(), accept.to_string())];
        if let Some(etag) = etag {
            headers.push(("If-None-Match".to_string(), etag.to_string()));
        }
        let request = HttpRequest::new(url, headers);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GitHubError::Cancelled),
            resp = self.transport().send(request) => Ok(resp?),
        }
    }

    /// Conditional GET against `url`, cached under `key`.
    ///
    /// Decodes 200 bodies as JSON, answers 304s from the cache, and
    /// classifies 403 and other statuses without retrying them.
    pub(crate) async fn fetch_conditional<T: DeserializeOwned>(
        &self,
        url: &str,
        key: &str,
        accept: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome<T>, GitHubError> {
        let mut conditional = true;

        for _ in 0..=MAX_CONDITIONAL_RETRIES {
            let cached = if conditional {
                self.cache().get(key).await
            } else {
                None
            };

            let resp = self
                .send_get(url, cached.as_ref().map(|c| c.etag.as_str()), accept, cancel)
                .await?;

            match resp.status {
                304 => {
                    self.metrics().cache_hit();
                    if let Some(entry) = cached {
                        tracing::debug!(key, "not modified");
                        return Ok(FetchOutcome::Data(serde_json::from_slice(&entry.body)?));
                    }
                    // Stale token with nothing behind it; drop it and go
                    // out unconditionally.
                    tracing::warn!(key, "not modified but no cached body, refetching");
                    self.cache().invalidate(key).await;
                    conditional = false;
                }
                403 => {
                    self.metrics().rate_limit_hit();
                    tracing::warn!(key, "rate limit hit");
                    return Ok(FetchOutcome::RateLimited);
                }
                200 => {
                    let data: T = serde_json::from_slice(&resp.body)?;
                    if let Some(etag) = resp.header("etag") {
                        self.cache()
                            .put(key, CachedResponse::new(etag, resp.body.clone()))
                            .await;
                    }
                    return Ok(FetchOutcome::Data(data));
                }
                status => {
                    tracing::debug!(key, status, "unexpected status");
                    return Ok(FetchOutcome::ApiError(
                        String::from_utf8_lossy(&resp.body).into_owned(),
                    ));
                }
            }
        }

        Ok(FetchOutcome::NotModified)
    }
}
