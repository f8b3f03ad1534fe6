use std::time::Duration;

/// Errors related to configuration resolution and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Errors from the language-model interface.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model provider error: {0}")]
    Provider(String),

    #[error("Model returned no text content")]
    EmptyResponse,

    #[error("Model output failed schema validation: {0}")]
    Malformed(String),
}

/// Errors from the search layer.
///
/// `RateLimited` is a distinct variant (rather than a `Status` code) so that
/// callers can apply a different retry rule to 429-equivalent responses.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Transport(String),

    #[error("Search returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed search payload: {0}")]
    MalformedPayload(String),

    #[error("Search provider rate limited (retry-after: {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Search timed out after {0:?}")]
    Timeout(Duration),
}

impl SearchError {
    /// Whether a retry could plausibly succeed: transport failures, request
    /// timeouts, and 5xx responses. 4xx responses (including rate limits,
    /// which have their own single-retry rule) are not transient.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Transport(_) | SearchError::Timeout(_) => true,
            SearchError::Status { status } => *status >= 500,
            SearchError::MalformedPayload(_) | SearchError::RateLimited { .. } => false,
        }
    }
}

/// Errors from query decomposition.
#[derive(Debug, thiserror::Error)]
pub enum DecomposeError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Decomposition proposed {count} subtasks (allowed 1..={max})")]
    Validation { count: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_timeout_are_transient() {
        assert!(SearchError::Transport("connection reset".into()).is_transient());
        assert!(SearchError::Timeout(Duration::from_secs(5)).is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        assert!(SearchError::Status { status: 500 }.is_transient());
        assert!(SearchError::Status { status: 503 }.is_transient());
        assert!(!SearchError::Status { status: 404 }.is_transient());
        assert!(!SearchError::Status { status: 401 }.is_transient());
    }

    #[test]
    fn rate_limited_is_not_transient() {
        assert!(
            !SearchError::RateLimited {
                retry_after: Some(Duration::from_secs(2))
            }
            .is_transient()
        );
    }
}
