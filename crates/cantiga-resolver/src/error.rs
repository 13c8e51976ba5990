//! Error types for the resolution pipeline.

use thiserror::Error;

use crate::throttle::{BudgetExhausted, ThrottlePolicy};

/// Errors that can occur while talking to the remote catalog.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The remote endpoint answered with a non-success status.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The request budget was exhausted under a failing throttle policy.
    ///
    /// Only `FailFast` and `RetryWithBackoff` produce this; the `Wait`
    /// policy blocks instead of failing on budget grounds.
    #[error("rate limit exceeded ({policy} policy)")]
    RateLimited {
        policy: ThrottlePolicy,
        #[source]
        cause: BudgetExhausted,
    },

    /// A fetched document failed the song-page validity check. The URL
    /// itself is wrong, so retrying is pointless.
    #[error("not a song page: {url}")]
    InvalidPage { url: String },

    /// A response body could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest` (transport-level).
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl ResolveError {
    /// Returns `true` when the error is transient and the whole
    /// resolve/extract call may succeed if re-invoked.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Request(_) | Self::RateLimited { .. }
        )
    }

    /// Returns `true` when the error is a rate-limit rejection.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Convenience alias for pipeline results.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limited_is_transient() {
        let err = ResolveError::RateLimited {
            policy: ThrottlePolicy::FailFast,
            cause: BudgetExhausted {
                in_window: 2,
                max_requests: 2,
                retry_after: Duration::from_millis(500),
            },
        };
        assert!(err.is_transient());
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("fail-fast"));
    }

    #[test]
    fn test_invalid_page_is_not_transient() {
        let err = ResolveError::InvalidPage {
            url: "https://example.com/artist-discography".to_string(),
        };
        assert!(!err.is_transient());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_rate_limited_carries_cause() {
        let err = ResolveError::RateLimited {
            policy: ThrottlePolicy::RetryWithBackoff,
            cause: BudgetExhausted {
                in_window: 1,
                max_requests: 1,
                retry_after: Duration::from_millis(100),
            },
        };
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }
}
