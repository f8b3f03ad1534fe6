//! Search client with normalization, retry, and timeout.
//!
//! [`SearchClient`] wraps any [`backend::SearchBackend`] with the outbound
//! policy shared by all workers: a per-request timeout, bounded exponential
//! backoff for transient failures (transport errors, request timeouts, 5xx),
//! and a separate single-retry rule for rate limits. 4xx responses are never
//! retried. Workers may invoke the client concurrently; it holds no mutable
//! state.

pub mod backend;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{AppConfig, SearchProvider};
use crate::error::SearchError;
use backend::{BraveSearch, DuckDuckGo, SearchBackend};

/// A single search result with title, URL, and excerpt.
#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub title: String,
    pub url: String,
    pub excerpt: String,
}

/// One completed search call: ranked snippets plus the fetch timestamp.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub snippets: Vec<Snippet>,
    pub fetched_at: DateTime<Utc>,
}

/// Maximum retries for transient failures (3 attempts total).
const MAX_RETRIES: u32 = 2;
/// First backoff delay; doubles per retry.
const BACKOFF_BASE: Duration = Duration::from_millis(200);
/// Backoff ceiling for transient retries.
const BACKOFF_CAP: Duration = Duration::from_secs(1);
/// Rate-limit backoff when the provider gives no retry-after hint.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);
/// Ceiling on a provider-supplied retry-after hint.
const RATE_LIMIT_BACKOFF_CAP: Duration = Duration::from_secs(5);

/// Retrying, timeout-bounded facade over a [`SearchBackend`].
///
/// Cheap to clone; all workers share the same backend via `Arc`.
#[derive(Clone)]
pub struct SearchClient {
    backend: Arc<dyn SearchBackend>,
    max_results: usize,
}

impl SearchClient {
    pub fn new(backend: Arc<dyn SearchBackend>, max_results: usize) -> Self {
        Self {
            backend,
            max_results,
        }
    }

    /// Build the backend selected by config. The Brave key requirement was
    /// already validated at config finalization.
    pub fn from_config(config: &AppConfig) -> Result<Self, SearchError> {
        let backend: Arc<dyn SearchBackend> = match config.search_provider {
            SearchProvider::DuckDuckGo => Arc::new(DuckDuckGo::new()?),
            SearchProvider::Brave => {
                let key = config.brave_api_key.clone().ok_or_else(|| {
                    SearchError::Transport("Brave selected without an API key".to_string())
                })?;
                Arc::new(BraveSearch::new(key)?)
            }
        };
        Ok(Self::new(backend, config.max_results))
    }

    /// Execute one search with retries.
    ///
    /// Each attempt is bounded by `timeout`. Transient failures retry up to
    /// [`MAX_RETRIES`] times with exponential backoff; a rate limit retries
    /// at most once, waiting for the provider's retry-after hint (capped)
    /// when one was given. An empty snippet list is a legitimate success
    /// here -- the worker layer decides what it means.
    pub async fn query(&self, text: &str, timeout: Duration) -> Result<SearchResult, SearchError> {
        let mut attempt: u32 = 0;
        let mut rate_limit_retried = false;

        loop {
            let outcome =
                tokio::time::timeout(timeout, self.backend.fetch(text, self.max_results)).await;

            let err = match outcome {
                Ok(Ok(snippets)) => {
                    return Ok(SearchResult {
                        snippets,
                        fetched_at: Utc::now(),
                    });
                }
                Ok(Err(e)) => e,
                Err(_) => SearchError::Timeout(timeout),
            };

            match &err {
                SearchError::RateLimited { retry_after } if !rate_limit_retried => {
                    rate_limit_retried = true;
                    let wait = (*retry_after)
                        .unwrap_or(RATE_LIMIT_BACKOFF)
                        .min(RATE_LIMIT_BACKOFF_CAP);
                    tracing::warn!(query = text, wait_ms = wait.as_millis() as u64, "Search rate limited, retrying once");
                    tokio::time::sleep(wait).await;
                }
                e if e.is_transient() && attempt < MAX_RETRIES => {
                    let backoff = backoff_delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        query = text,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Transient search failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                _ => return Err(err),
            }
        }
    }
}

/// Exponential backoff: base 200ms, factor 2, capped at 1s.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    (BACKOFF_BASE * factor).min(BACKOFF_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(200));
        assert_eq!(backoff_delay(1), Duration::from_millis(400));
        assert_eq!(backoff_delay(2), Duration::from_millis(800));
        assert_eq!(backoff_delay(3), Duration::from_secs(1));
        assert_eq!(backoff_delay(10), Duration::from_secs(1));
    }
}
