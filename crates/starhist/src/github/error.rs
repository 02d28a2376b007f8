//! GitHub API error types.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur while collecting star history.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// Network-level failure, propagated from the transport untouched.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// The API answered 403, rate limit exceeded. Callers should back
    /// off rather than retry immediately.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The computed page count exceeds the ceiling GitHub will serve
    /// for the stargazer endpoint; no page requests were issued.
    #[error("repo has too many stargazers, github won't allow us to list all stars ({pages} pages)")]
    TooManyStars { pages: u32 },

    /// Any other non-2xx/304 status; carries the response body as
    /// diagnostic detail.
    #[error("github API error: {0}")]
    Api(String),

    /// Malformed JSON on an otherwise successful response.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller cancelled the collection.
    #[error("collection cancelled")]
    Cancelled,
}

impl GitHubError {
    /// True for failures a caller may reasonably retry after a delay.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_rate_limited_only_for_rate_limit_errors() {
        assert!(GitHubError::RateLimited.is_rate_limited());
        assert!(!GitHubError::Cancelled.is_rate_limited());
        assert!(!GitHubError::TooManyStars { pages: 450 }.is_rate_limited());
        assert!(!GitHubError::Api("boom".to_string()).is_rate_limited());
    }

    #[test]
    fn transport_errors_pass_through_display() {
        let err: GitHubError = HttpError::Transport("dns failure".to_string()).into();
        assert_eq!(err.to_string(), "http transport error: dns failure");
    }
}
