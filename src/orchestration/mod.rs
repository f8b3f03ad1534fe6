//! Research orchestration subsystem.
//!
//! Provides the [`orchestrator::Orchestrator`] end-to-end flow (decompose,
//! fan out, join, synthesize), the [`registry::TaskRegistry`] for subtask
//! lifecycle tracking, and the shared [`types`] used across the layer.

pub mod decomposer;
pub mod orchestrator;
pub mod prompts;
pub mod registry;
pub mod types;
pub mod worker;
