//! Fetch error types for the pipeline's network-facing stages.

use thiserror::Error;

/// Errors that can occur while scraping charts or fetching lyrics.
#[derive(Debug, Error)]
pub enum FetchError {
    /// An HTTP request to an external source failed with a status code.
    #[error("HTTP {status} from {source_name}: {message}")]
    Http {
        source_name: String,
        status: u16,
        message: String,
    },

    /// The external source returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The requested entity was not found at the external source.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A response from an external source could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// A scraped page no longer has the structure the parser expects.
    #[error("unexpected page layout at {url}: {message}")]
    Layout { url: String, message: String },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the artifact store.
    #[error("store error: {0}")]
    Store(#[from] stanza_core::Error),
}

impl FetchError {
    /// Build the error for a non-success HTTP status.
    pub fn from_status(source_name: &str, status: reqwest::StatusCode, message: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited {
                source_name: source_name.to_string(),
            }
        } else {
            Self::Http {
                source_name: source_name.to_string(),
                status: status.as_u16(),
                message,
            }
        }
    }

    /// Returns `true` when the error is transient and the operation may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500,
            Self::RateLimited { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::NotFound { .. } | Self::Parse { .. } | Self::Layout { .. } | Self::Store(_) => {
                false
            }
        }
    }

    /// Returns `true` when the error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for fetch results.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let err = FetchError::from_status("Genius", reqwest::StatusCode::BAD_GATEWAY, "bad".into());
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_errors_are_permanent() {
        let err = FetchError::from_status("Genius", reqwest::StatusCode::UNAUTHORIZED, "no".into());
        assert!(!err.is_transient());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_too_many_requests_is_rate_limited() {
        let err = FetchError::from_status("Genius", reqwest::StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(matches!(err, FetchError::RateLimited { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_not_found_and_layout() {
        let not_found = FetchError::NotFound {
            entity: "song".into(),
            source_name: "Genius".into(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_transient());

        let layout = FetchError::Layout {
            url: "https://example.com".into(),
            message: "missing rows".into(),
        };
        assert!(!layout.is_transient());
    }
}
