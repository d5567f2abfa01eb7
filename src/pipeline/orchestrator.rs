// Pipeline selection and sequential execution

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::context::{RunContext, RunState, StageOutput};
use super::task::{TaskBook, TaskKind};
use crate::agents::{AgentRoster, ReasoningFailure, RunInputs, TaskBrief, TemplateValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Comprehensive,
    MedicalOnly,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 2] = [AnalysisMode::Comprehensive, AnalysisMode::MedicalOnly];

    pub const fn name(self) -> &'static str {
        match self {
            AnalysisMode::Comprehensive => "comprehensive",
            AnalysisMode::MedicalOnly => "medical_only",
        }
    }

    /// Exact match only; anything else, including case or whitespace
    /// variants, falls back to `medical_only`.
    pub fn resolve(mode: &str) -> Self {
        match mode {
            "comprehensive" => AnalysisMode::Comprehensive,
            _ => AnalysisMode::MedicalOnly,
        }
    }

    pub const fn tasks(self) -> &'static [TaskKind] {
        match self {
            AnalysisMode::Comprehensive => &[
                TaskKind::Verification,
                TaskKind::MedicalAnalysis,
                TaskKind::NutritionAnalysis,
                TaskKind::ExercisePlanning,
            ],
            AnalysisMode::MedicalOnly => &[TaskKind::MedicalAnalysis],
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage {index} ({task}) failed: {source}")]
    Stage {
        index: usize,
        task: TaskKind,
        #[source]
        source: ReasoningFailure,
    },

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),
}

/// An ordered, validated task sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    tasks: Vec<TaskKind>,
}

impl Pipeline {
    pub fn new(tasks: Vec<TaskKind>) -> Result<Self, PipelineError> {
        if tasks.is_empty() {
            return Err(PipelineError::InvalidPipeline("no tasks".to_string()));
        }
        for (i, task) in tasks.iter().enumerate() {
            let agent = task.definition().agent;
            if tasks[..i].iter().any(|earlier| earlier.definition().agent == agent) {
                return Err(PipelineError::InvalidPipeline(format!(
                    "{} appears in more than one stage",
                    agent
                )));
            }
        }
        Ok(Self { tasks })
    }

    pub fn for_mode(mode: AnalysisMode) -> Result<Self, PipelineError> {
        Self::new(mode.tasks().to_vec())
    }

    pub fn tasks(&self) -> &[TaskKind] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub mode: AnalysisMode,
    /// Output of the final stage.
    pub analysis: String,
    pub stages: Vec<StageOutput>,
}

/// Drives a pipeline over the agent roster. Shared read-only by every run.
pub struct Orchestrator {
    roster: Arc<AgentRoster>,
    tasks: Arc<TaskBook>,
}

impl Orchestrator {
    pub fn new(roster: Arc<AgentRoster>, tasks: Arc<TaskBook>) -> Self {
        Self { roster, tasks }
    }

    pub async fn run(
        &self,
        mode: AnalysisMode,
        query: &str,
        document: &Path,
    ) -> Result<PipelineOutcome, PipelineError> {
        let pipeline = Pipeline::for_mode(mode)?;
        let mut ctx = RunContext::new(query, document);
        let analysis = self.execute(&pipeline, &mut ctx).await?;
        Ok(PipelineOutcome {
            mode,
            analysis,
            stages: ctx.into_outputs(),
        })
    }

    /// Runs every stage in order, appending each output to `ctx`. Returns
    /// the last stage's output.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        ctx: &mut RunContext,
    ) -> Result<String, PipelineError> {
        if pipeline.is_empty() {
            return Err(PipelineError::InvalidPipeline("no tasks".to_string()));
        }
        let run_id = ctx.id();
        info!(run = %run_id, stages = pipeline.len(), "Pipeline starting");

        let file_path = ctx.document().display().to_string();
        for (index, kind) in pipeline.tasks().iter().copied().enumerate() {
            ctx.set_state(RunState::Running(index));
            info!(run = %run_id, stage = index, task = %kind, "Stage running");

            let spec = self.tasks.get(kind);
            let description = spec.describe(&TemplateValues {
                query: ctx.query(),
                file_path: &file_path,
            });
            let brief = TaskBrief {
                description: &description,
                expected_output: spec.definition.expected_output,
                tools: spec.definition.tools,
            };
            let prior = ctx.prior_context();
            let inputs = RunInputs {
                query: ctx.query(),
                document: ctx.document(),
                prior_context: prior.as_deref(),
            };

            let output = match self.roster.invoke(spec.agent(), brief, inputs).await {
                Ok(output) => output,
                Err(source) => {
                    ctx.set_state(RunState::Failed(index));
                    error!(
                        run = %run_id,
                        stage = index,
                        task = %kind,
                        elapsed_ms = ctx.elapsed_ms(),
                        error = %source,
                        "Stage failed"
                    );
                    return Err(PipelineError::Stage {
                        index,
                        task: kind,
                        source,
                    });
                }
            };
            ctx.record(kind, spec.agent(), output);
        }

        ctx.set_state(RunState::Succeeded);
        info!(run = %run_id, elapsed_ms = ctx.elapsed_ms(), "Pipeline succeeded");
        Ok(ctx
            .outputs()
            .last()
            .map(|stage| stage.output.clone())
            .unwrap_or_default())
    }
}
