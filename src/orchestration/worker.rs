//! Research worker.
//!
//! One worker resolves one subtask: plan a search query via the model, run
//! the search, then summarize the findings via the model with the cited
//! sources. Every failure -- model, search, empty results, timeout, or
//! cancellation -- is captured as a [`SubtaskOutcome::Failure`]; nothing
//! escapes to the caller. Workers share no mutable state, so any number of
//! them can run concurrently.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;
use crate::model::{ModelClient, extract_json};
use crate::search::{SearchClient, SearchResult};

use super::prompts;
use super::types::{FailureKind, Subtask, SubtaskOutcome};

/// Strict schema for the worker's summarization model call.
#[derive(Debug, Deserialize)]
struct WorkerSummary {
    summary: String,
    #[serde(default)]
    cited_urls: Vec<String>,
}

/// Executes one subtask end to end. Cheap to clone; one clone is moved
/// into each spawned worker task.
#[derive(Clone)]
pub struct WorkerAgent {
    model: Arc<dyn ModelClient>,
    search: SearchClient,
    search_timeout: Duration,
}

impl WorkerAgent {
    pub fn new(model: Arc<dyn ModelClient>, search: SearchClient, search_timeout: Duration) -> Self {
        Self {
            model,
            search,
            search_timeout,
        }
    }

    /// Resolve a subtask within `timeout`, honoring `cancel`.
    ///
    /// Always returns exactly one outcome; expiry of the timeout or the
    /// cancellation token yields `Failure{Timeout}`.
    pub async fn execute(
        &self,
        subtask: &Subtask,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> SubtaskOutcome {
        tokio::select! {
            outcome = self.resolve(subtask) => outcome,
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(subtask_id = %subtask.id, timeout_ms = timeout.as_millis() as u64, "Subtask timed out");
                SubtaskOutcome::Failure {
                    subtask_id: subtask.id.clone(),
                    reason: FailureKind::Timeout,
                }
            }
            _ = cancel.cancelled() => {
                tracing::warn!(subtask_id = %subtask.id, "Subtask cancelled at the global deadline");
                SubtaskOutcome::Failure {
                    subtask_id: subtask.id.clone(),
                    reason: FailureKind::Timeout,
                }
            }
        }
    }

    /// The plan -> search -> summarize pipeline, without timeout handling.
    async fn resolve(&self, subtask: &Subtask) -> SubtaskOutcome {
        let fail = |reason: FailureKind| SubtaskOutcome::Failure {
            subtask_id: subtask.id.clone(),
            reason,
        };

        // (a) Plan the search query.
        let query = match self
            .model
            .complete(prompts::PLANNER_SYSTEM, &prompts::search_plan(subtask))
            .await
        {
            Ok(text) => normalize_query(&text),
            Err(e) => {
                tracing::warn!(subtask_id = %subtask.id, error = %e, "Search planning failed");
                return fail(FailureKind::Model);
            }
        };

        // (b) Search.
        let result = match self.search.query(&query, self.search_timeout).await {
            Ok(r) => r,
            Err(SearchError::RateLimited { .. }) => {
                tracing::warn!(subtask_id = %subtask.id, "Search rate limited");
                return fail(FailureKind::RateLimited);
            }
            Err(e) => {
                tracing::warn!(subtask_id = %subtask.id, error = %e, "Search failed");
                return fail(FailureKind::Search);
            }
        };

        // Zero snippets is a legitimate non-fatal outcome, not a search error.
        if result.snippets.is_empty() {
            tracing::info!(subtask_id = %subtask.id, query = %query, "Search returned no results");
            return fail(FailureKind::EmptyResult);
        }

        // (c) Summarize with citations.
        let raw = match self
            .model
            .complete(
                prompts::SUMMARIZER_SYSTEM,
                &prompts::summarize(subtask, &result),
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(subtask_id = %subtask.id, error = %e, "Summarization failed");
                return fail(FailureKind::Model);
            }
        };

        let parsed: WorkerSummary = match serde_json::from_str(extract_json(&raw)) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(subtask_id = %subtask.id, error = %e, "Summary failed schema validation");
                return fail(FailureKind::Model);
            }
        };

        SubtaskOutcome::Success {
            subtask_id: subtask.id.clone(),
            summary: parsed.summary,
            sources: cited_sources(&parsed.cited_urls, &result),
        }
    }
}

/// Normalize the model's proposed search query: first line only, trimmed,
/// surrounding quotes stripped.
fn normalize_query(raw: &str) -> String {
    let line = raw.lines().next().unwrap_or("").trim();
    line.trim_matches('"').trim_matches('\'').trim().to_string()
}

/// Keep only cited URLs that actually appear in the search results; a model
/// cannot cite a source it was never shown.
fn cited_sources(cited: &[String], result: &SearchResult) -> BTreeSet<String> {
    let known: BTreeSet<&str> = result.snippets.iter().map(|s| s.url.as_str()).collect();
    cited
        .iter()
        .filter(|url| known.contains(url.as_str()))
        .cloned()
        .collect()
}
