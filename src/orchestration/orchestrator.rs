//! End-to-end request flow: decompose, fan out, join, synthesize.
//!
//! The orchestrator owns the only nontrivial concurrency in the system.
//! After decomposition it spawns one tokio task per subtask and collects
//! outcomes into slots indexed by decomposition order, so the synthesis
//! input is deterministic regardless of completion order. A global deadline
//! bounds the whole fan-out: when it elapses, pending workers are cancelled
//! through the registry's token hierarchy and recorded as timeouts. Every
//! dispatched subtask yields exactly one outcome.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::model::ModelClient;
use crate::search::SearchClient;

use super::decomposer::Decomposer;
use super::prompts;
use super::registry::TaskRegistry;
use super::types::{FailureKind, FinalAnswer, Subtask, SubtaskOutcome, SubtaskStatus};
use super::worker::WorkerAgent;

/// Answer text when no subtask produced any findings.
const NO_FINDINGS_TEXT: &str = "unable to find information";

pub struct Orchestrator {
    model: Arc<dyn ModelClient>,
    decomposer: Decomposer,
    worker: WorkerAgent,
    max_subtasks: usize,
    subtask_timeout: Duration,
    global_deadline: Duration,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ModelClient>, search: SearchClient, config: &AppConfig) -> Self {
        Self {
            decomposer: Decomposer::new(model.clone()),
            worker: WorkerAgent::new(model.clone(), search, config.search_timeout),
            model,
            max_subtasks: config.max_subtasks,
            subtask_timeout: config.subtask_timeout,
            global_deadline: config.global_deadline,
        }
    }

    /// Answer one query. Always produces a `FinalAnswer`; degraded paths
    /// (decomposition fallback, partial failures, synthesis fallback) are
    /// folded into the answer rather than surfaced as errors.
    pub async fn run(&self, query: &str) -> FinalAnswer {
        let subtasks = match self.decomposer.split(query, self.max_subtasks).await {
            Ok(subtasks) => subtasks,
            Err(e) => {
                // Degrade-to-one policy: treat the whole query as a single
                // research subtask instead of aborting the request.
                tracing::warn!(error = %e, "Decomposition failed, falling back to a single subtask");
                vec![Subtask::new(
                    query.to_string(),
                    "fallback: research the whole query as one task".to_string(),
                )]
            }
        };

        tracing::info!(count = subtasks.len(), "Dispatching research subtasks");

        let outcomes = self.execute_all(&subtasks).await;
        self.aggregate(query, &subtasks, &outcomes).await
    }

    /// Dispatch one worker per subtask and join all outcomes, bounded by
    /// the global deadline.
    ///
    /// Returns exactly one outcome per subtask, in subtask order. Subtasks
    /// still pending when the deadline elapses are cancelled and recorded
    /// as `Failure{Timeout}`.
    pub async fn execute_all(&self, subtasks: &[Subtask]) -> Vec<SubtaskOutcome> {
        let registry = TaskRegistry::new(CancellationToken::new());
        let mut slots: Vec<Option<SubtaskOutcome>> = vec![None; subtasks.len()];
        let mut join_set: JoinSet<(usize, SubtaskOutcome)> = JoinSet::new();

        for (idx, subtask) in subtasks.iter().enumerate() {
            match registry.register(subtask) {
                Ok(token) => {
                    let worker = self.worker.clone();
                    let subtask = subtask.clone();
                    let timeout = self.subtask_timeout;
                    join_set.spawn(async move {
                        (idx, worker.execute(&subtask, timeout, token).await)
                    });
                }
                Err(e) => {
                    // Unreachable with UUID ids; recorded as a failure so the
                    // one-outcome-per-subtask invariant holds regardless.
                    tracing::error!(subtask_id = %subtask.id, error = %e, "Failed to register subtask");
                    slots[idx] = Some(SubtaskOutcome::Failure {
                        subtask_id: subtask.id.clone(),
                        reason: FailureKind::Model,
                    });
                }
            }
        }

        let deadline = tokio::time::Instant::now() + self.global_deadline;

        loop {
            tokio::select! {
                joined = join_set.join_next() => match joined {
                    Some(Ok((idx, outcome))) => {
                        let status = match &outcome {
                            SubtaskOutcome::Success { .. } => SubtaskStatus::Succeeded,
                            SubtaskOutcome::Failure { reason, .. } => {
                                SubtaskStatus::Failed(*reason)
                            }
                        };
                        registry.mark_terminal(outcome.subtask_id(), status);
                        slots[idx] = Some(outcome);
                    }
                    Some(Err(e)) => {
                        // A panicked worker; its slot is filled below.
                        tracing::error!(error = %e, "Worker task failed to join");
                    }
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(
                        pending = registry.pending_count(),
                        "Global deadline elapsed, cancelling pending subtasks"
                    );
                    registry.cancel_all();
                    join_set.abort_all();
                    break;
                }
            }
        }

        // Any slot still empty (deadline expiry, worker panic) becomes a
        // timeout failure, preserving one outcome per subtask.
        for (idx, slot) in slots.iter_mut().enumerate() {
            if slot.is_none() {
                let id = subtasks[idx].id.clone();
                registry.mark_terminal(&id, SubtaskStatus::Failed(FailureKind::Timeout));
                *slot = Some(SubtaskOutcome::Failure {
                    subtask_id: id,
                    reason: FailureKind::Timeout,
                });
            }
        }

        slots.into_iter().flatten().collect()
    }

    /// Merge worker outcomes into the final answer.
    ///
    /// With zero successes the canned no-findings answer is returned without
    /// a model call. When the synthesis call itself fails despite having
    /// successes, the summaries are concatenated verbatim instead.
    async fn aggregate(
        &self,
        query: &str,
        subtasks: &[Subtask],
        outcomes: &[SubtaskOutcome],
    ) -> FinalAnswer {
        let partial = outcomes.iter().any(|o| !o.is_success());

        let mut summaries: Vec<(String, String)> = Vec::new();
        let mut sources: BTreeSet<String> = BTreeSet::new();

        // Outcomes arrive in subtask order; pair each success with its
        // subtask description for the synthesis prompt.
        for (subtask, outcome) in subtasks.iter().zip(outcomes) {
            if let SubtaskOutcome::Success {
                summary,
                sources: cited,
                ..
            } = outcome
            {
                summaries.push((subtask.description.clone(), summary.clone()));
                sources.extend(cited.iter().cloned());
            }
        }

        if summaries.is_empty() {
            tracing::warn!("All subtasks failed, returning the no-findings answer");
            return FinalAnswer {
                text: NO_FINDINGS_TEXT.to_string(),
                sources: BTreeSet::new(),
                partial: true,
            };
        }

        let text = match self
            .model
            .complete(
                prompts::SYNTHESIS_SYSTEM,
                &prompts::synthesize(query, &summaries),
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                // Degraded but present: hand back the raw summaries rather
                // than failing the request at the last step.
                tracing::warn!(error = %e, "Synthesis failed, concatenating summaries verbatim");
                summaries
                    .iter()
                    .map(|(_, summary)| summary.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
        };

        FinalAnswer {
            text,
            sources,
            partial,
        }
    }
}
