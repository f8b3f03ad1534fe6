//! Type definitions for the research orchestration subsystem.
//!
//! These types form the shared vocabulary between the [`super::decomposer`],
//! [`super::worker`], [`super::registry`], and [`super::orchestrator`]
//! modules. All types derive [`serde::Serialize`] for structured log output.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Unique identifier for a subtask within one request.
///
/// Uses UUID v4 strings for collision-free IDs that are readable in logs.
pub type SubtaskId = String;

/// One decomposed unit of research work derived from the original query.
/// Immutable after creation; order within the request is the decomposition
/// order and is preserved through to final synthesis.
#[derive(Clone, Debug, Serialize)]
pub struct Subtask {
    pub id: SubtaskId,
    /// What to research.
    pub description: String,
    /// Why this subtask helps answer the original query.
    pub rationale: String,
}

impl Subtask {
    pub fn new(description: String, rationale: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description,
            rationale,
        }
    }
}

/// Why a worker failed to resolve its subtask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A model call errored or returned an unusable structure.
    Model,
    /// The search layer failed after exhausting its retries.
    Search,
    /// The search provider rate-limited us and the single retry also failed.
    RateLimited,
    /// The per-subtask timeout or global deadline elapsed.
    Timeout,
    /// The search succeeded but returned zero snippets.
    EmptyResult,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Model => "model",
            FailureKind::Search => "search",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Timeout => "timeout",
            FailureKind::EmptyResult => "empty_result",
        };
        f.write_str(s)
    }
}

/// Terminal outcome of one worker execution. Exactly one is produced per
/// dispatched subtask; failures are data, not control flow.
#[derive(Clone, Debug, Serialize)]
pub enum SubtaskOutcome {
    Success {
        subtask_id: SubtaskId,
        /// Grounded summary of findings.
        summary: String,
        /// URLs the summary actually cites.
        sources: BTreeSet<String>,
    },
    Failure {
        subtask_id: SubtaskId,
        reason: FailureKind,
    },
}

impl SubtaskOutcome {
    pub fn subtask_id(&self) -> &str {
        match self {
            SubtaskOutcome::Success { subtask_id, .. }
            | SubtaskOutcome::Failure { subtask_id, .. } => subtask_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubtaskOutcome::Success { .. })
    }
}

/// Lifecycle state of a dispatched subtask. `Succeeded` and `Failed` are
/// terminal; a subtask is never re-dispatched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SubtaskStatus {
    Dispatched,
    Succeeded,
    Failed(FailureKind),
}

impl SubtaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubtaskStatus::Dispatched)
    }
}

/// Read-only view of a registry entry, returned by status queries.
///
/// This is a snapshot -- the actual entry may change after this clone is
/// returned. Cheap to clone since all fields are small strings/enums.
#[derive(Clone, Debug, Serialize)]
pub struct SubtaskInfo {
    pub id: SubtaskId,
    pub description: String,
    pub status: SubtaskStatus,
    /// ISO 8601 timestamp when the subtask was dispatched.
    pub dispatched_at: String,
    /// ISO 8601 timestamp when the subtask reached a terminal state.
    pub completed_at: Option<String>,
}

/// The answer returned to the caller. `partial` is true iff at least one
/// subtask outcome was a failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FinalAnswer {
    pub text: String,
    pub sources: BTreeSet<String>,
    pub partial: bool,
}
