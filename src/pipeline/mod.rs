//! Pipeline Orchestrator
//!
//! Selects the task sequence for an analysis mode and runs it strictly in
//! order, threading a [`RunContext`] through every stage:
//!
//! ```text
//! Pending ──► Running(0) ──► Running(1) ──► ... ──► Succeeded
//!                 │               │
//!                 └───────────────┴──► Failed(i)
//! ```
//!
//! Verification output is passed downstream as advisory text; it never
//! gates later stages.

pub mod context;
pub mod orchestrator;
pub mod task;

pub use context::{RunContext, RunState, StageOutput};
pub use orchestrator::{AnalysisMode, Orchestrator, Pipeline, PipelineError, PipelineOutcome};
pub use task::{TaskBook, TaskDefinition, TaskKind, TaskSpec};
