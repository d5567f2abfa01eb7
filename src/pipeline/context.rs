// Per-run state threaded through a pipeline execution

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::task::TaskKind;
use crate::agents::AgentRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running(usize),
    Succeeded,
    Failed(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutput {
    pub task: TaskKind,
    pub agent: AgentRole,
    pub output: String,
    pub completed_at: DateTime<Utc>,
}

/// Owned by exactly one run; never shared between requests.
#[derive(Debug)]
pub struct RunContext {
    id: Uuid,
    query: String,
    document: PathBuf,
    outputs: Vec<StageOutput>,
    state: RunState,
    started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(query: impl Into<String>, document: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            document: document.into(),
            outputs: Vec::new(),
            state: RunState::Pending,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    /// Stage outputs in execution order.
    pub fn outputs(&self) -> &[StageOutput] {
        &self.outputs
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Milliseconds since the run was created.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    pub(crate) fn set_state(&mut self, state: RunState) {
        self.state = state;
    }

    /// Append-only.
    pub(crate) fn record(&mut self, task: TaskKind, agent: AgentRole, output: String) {
        self.outputs.push(StageOutput {
            task,
            agent,
            output,
            completed_at: Utc::now(),
        });
    }

    /// Earlier outputs rendered for the next stage's prompt.
    pub fn prior_context(&self) -> Option<String> {
        if self.outputs.is_empty() {
            return None;
        }
        let sections: Vec<String> = self
            .outputs
            .iter()
            .map(|stage| {
                format!(
                    "## {} ({})\n{}",
                    stage.task,
                    stage.agent.profile().title,
                    stage.output
                )
            })
            .collect();
        Some(sections.join("\n\n"))
    }

    pub fn into_outputs(self) -> Vec<StageOutput> {
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_pending_and_empty() {
        let ctx = RunContext::new("q", "data/x.pdf");
        assert_eq!(ctx.state(), RunState::Pending);
        assert!(ctx.outputs().is_empty());
        assert!(ctx.prior_context().is_none());
        assert_eq!(ctx.document(), Path::new("data/x.pdf"));
        assert!(ctx.elapsed_ms() >= 0);
    }

    #[test]
    fn test_prior_context_lists_stages_in_order() {
        let mut ctx = RunContext::new("q", "data/x.pdf");
        ctx.record(TaskKind::Verification, AgentRole::Verifier, "valid report".to_string());
        ctx.record(TaskKind::MedicalAnalysis, AgentRole::Doctor, "mild anemia".to_string());

        let context = ctx.prior_context().unwrap();
        let first = context.find("## verification (Medical Report Validator)").unwrap();
        let second = context.find("## medical_analysis (Senior Medical Doctor)").unwrap();
        assert!(first < second);
        assert!(context.contains("mild anemia"));
    }
}
