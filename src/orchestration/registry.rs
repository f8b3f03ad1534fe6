//! Per-request registry of dispatched subtasks.
//!
//! [`TaskRegistry`] is the single source of truth for subtask lifecycle
//! state within one request. It wraps a `HashMap` behind `Arc<Mutex<..>>`
//! for thread-safe access from the orchestrator and the worker tasks.
//!
//! **Concurrency model:** `Arc<Mutex<HashMap>>` is chosen over `DashMap` to
//! avoid an extra dependency. Contention is negligible -- the registry is
//! touched once at dispatch and once per terminal transition, with fan-out
//! capped at `max_subtasks`.
//!
//! **Cancellation model:** Each entry holds a [`CancellationToken`] created
//! as a child of the request's root token. Cancelling the root token (at the
//! global deadline) cascades to all in-flight workers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::types::{Subtask, SubtaskId, SubtaskInfo, SubtaskStatus};

struct TaskEntry {
    /// The read-only view returned by status queries.
    info: SubtaskInfo,
    /// Cancellation token for this entry (child of the root token).
    cancel_token: CancellationToken,
}

/// Registry for all subtasks of one request.
///
/// All fields are behind `Arc` or are `Clone`, so the struct itself derives
/// `Clone` for shared ownership between the orchestrator and spawned tasks.
#[derive(Clone)]
pub struct TaskRegistry {
    entries: Arc<Mutex<HashMap<SubtaskId, TaskEntry>>>,
    root_token: CancellationToken,
}

impl TaskRegistry {
    /// Create a new registry. Cancelling `root_token` cancels every
    /// registered subtask.
    pub fn new(root_token: CancellationToken) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            root_token,
        }
    }

    /// Register a subtask as dispatched and return its cancellation token.
    ///
    /// Returns `Err` if the id is already registered; a subtask is only
    /// ever dispatched once.
    pub fn register(&self, subtask: &Subtask) -> Result<CancellationToken, String> {
        let mut entries = self.entries.lock().unwrap();

        if entries.contains_key(&subtask.id) {
            return Err(format!("subtask already registered: {}", subtask.id));
        }

        let cancel_token = self.root_token.child_token();

        let info = SubtaskInfo {
            id: subtask.id.clone(),
            description: subtask.description.clone(),
            status: SubtaskStatus::Dispatched,
            dispatched_at: Utc::now().to_rfc3339(),
            completed_at: None,
        };

        entries.insert(
            subtask.id.clone(),
            TaskEntry {
                info,
                cancel_token: cancel_token.clone(),
            },
        );

        Ok(cancel_token)
    }

    /// Record a terminal status for a subtask, setting `completed_at`.
    ///
    /// Terminal states are final: once a subtask has succeeded or failed,
    /// further transitions are ignored. Returns `true` if the transition
    /// was applied.
    pub fn mark_terminal(&self, id: &str, status: SubtaskStatus) -> bool {
        debug_assert!(status.is_terminal());
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(id) {
            Some(entry) if !entry.info.status.is_terminal() && status.is_terminal() => {
                entry.info.status = status;
                entry.info.completed_at = Some(Utc::now().to_rfc3339());
                true
            }
            _ => false,
        }
    }

    /// Get a snapshot of a subtask's info. Returns `None` if not found.
    pub fn get(&self, id: &str) -> Option<SubtaskInfo> {
        let entries = self.entries.lock().unwrap();
        entries.get(id).map(|e| e.info.clone())
    }

    /// Return info snapshots for all registered subtasks.
    pub fn snapshot(&self) -> Vec<SubtaskInfo> {
        let entries = self.entries.lock().unwrap();
        entries.values().map(|e| e.info.clone()).collect()
    }

    /// Number of registered subtasks that have not reached a terminal state.
    pub fn pending_count(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries
            .values()
            .filter(|e| !e.info.status.is_terminal())
            .count()
    }

    /// Cancel every registered subtask by cancelling the root token.
    pub fn cancel_all(&self) {
        self.root_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::types::FailureKind;

    fn test_subtask(desc: &str) -> Subtask {
        Subtask::new(desc.to_string(), "test rationale".to_string())
    }

    #[test]
    fn register_returns_child_token() {
        let root = CancellationToken::new();
        let registry = TaskRegistry::new(root.clone());
        let subtask = test_subtask("research X");

        let token = registry.register(&subtask).unwrap();
        assert!(!token.is_cancelled());

        let info = registry.get(&subtask.id).unwrap();
        assert_eq!(info.status, SubtaskStatus::Dispatched);
        assert!(info.completed_at.is_none());

        root.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn register_rejects_duplicate_id() {
        let registry = TaskRegistry::new(CancellationToken::new());
        let subtask = test_subtask("research X");

        registry.register(&subtask).unwrap();
        let err = registry.register(&subtask).unwrap_err();
        assert!(err.contains("already registered"));
    }

    #[test]
    fn mark_terminal_sets_completed_at() {
        let registry = TaskRegistry::new(CancellationToken::new());
        let subtask = test_subtask("research X");
        registry.register(&subtask).unwrap();

        assert!(registry.mark_terminal(&subtask.id, SubtaskStatus::Succeeded));

        let info = registry.get(&subtask.id).unwrap();
        assert_eq!(info.status, SubtaskStatus::Succeeded);
        assert!(info.completed_at.is_some());
    }

    #[test]
    fn terminal_states_are_final() {
        let registry = TaskRegistry::new(CancellationToken::new());
        let subtask = test_subtask("research X");
        registry.register(&subtask).unwrap();

        assert!(registry.mark_terminal(&subtask.id, SubtaskStatus::Failed(FailureKind::Timeout)));
        // A later transition must not overwrite the first terminal state.
        assert!(!registry.mark_terminal(&subtask.id, SubtaskStatus::Succeeded));

        let info = registry.get(&subtask.id).unwrap();
        assert_eq!(info.status, SubtaskStatus::Failed(FailureKind::Timeout));
    }

    #[test]
    fn mark_terminal_unknown_id_returns_false() {
        let registry = TaskRegistry::new(CancellationToken::new());
        assert!(!registry.mark_terminal("ghost", SubtaskStatus::Succeeded));
    }

    #[test]
    fn pending_count_tracks_terminal_transitions() {
        let registry = TaskRegistry::new(CancellationToken::new());
        let a = test_subtask("a");
        let b = test_subtask("b");
        registry.register(&a).unwrap();
        registry.register(&b).unwrap();

        assert_eq!(registry.pending_count(), 2);
        registry.mark_terminal(&a.id, SubtaskStatus::Succeeded);
        assert_eq!(registry.pending_count(), 1);
    }

    #[test]
    fn cancel_all_cancels_every_child_token() {
        let registry = TaskRegistry::new(CancellationToken::new());
        let a = test_subtask("a");
        let b = test_subtask("b");
        let token_a = registry.register(&a).unwrap();
        let token_b = registry.register(&b).unwrap();

        registry.cancel_all();
        assert!(token_a.is_cancelled());
        assert!(token_b.is_cancelled());
    }

    #[test]
    fn snapshot_returns_all_entries() {
        let registry = TaskRegistry::new(CancellationToken::new());
        for i in 0..3 {
            registry.register(&test_subtask(&format!("t{i}"))).unwrap();
        }
        assert_eq!(registry.snapshot().len(), 3);
    }
}
