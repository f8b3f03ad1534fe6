//! Query decomposition.
//!
//! One model call splits the original query into a bounded set of focused
//! subtasks. The model's structured output is validated immediately: an
//! unparseable response is a [`ModelError`], a count outside
//! `1..=max_subtasks` is a validation failure. Either way the orchestrator
//! degrades to a single subtask covering the whole query rather than
//! failing the request.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::{DecomposeError, ModelError};
use crate::model::{ModelClient, extract_json};

use super::prompts;
use super::types::Subtask;

/// Strict schema for the decomposition model call.
#[derive(Debug, Deserialize)]
struct DecompositionPlan {
    subtasks: Vec<PlannedSubtask>,
}

#[derive(Debug, Deserialize)]
struct PlannedSubtask {
    description: String,
    rationale: String,
}

pub struct Decomposer {
    model: Arc<dyn ModelClient>,
}

impl Decomposer {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    /// Split a query into `1..=max_subtasks` subtasks, in plan order.
    ///
    /// Side effect: exactly one outbound model call.
    pub async fn split(
        &self,
        query: &str,
        max_subtasks: usize,
    ) -> Result<Vec<Subtask>, DecomposeError> {
        let raw = self
            .model
            .complete(
                prompts::DECOMPOSER_SYSTEM,
                &prompts::decompose(query, max_subtasks),
            )
            .await?;

        let plan: DecompositionPlan = serde_json::from_str(extract_json(&raw))
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        let count = plan.subtasks.len();
        if count == 0 || count > max_subtasks {
            return Err(DecomposeError::Validation {
                count,
                max: max_subtasks,
            });
        }

        tracing::debug!(count, "Query decomposed");

        Ok(plan
            .subtasks
            .into_iter()
            .map(|p| Subtask::new(p.description, p.rationale))
            .collect())
    }
}
