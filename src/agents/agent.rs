//! Reasoning agent
//!
//! One agent = one static [`AgentProfile`] + the shared reasoning backend +
//! a per-role rate limiter. An invocation is a short tool-use loop:
//!
//! ```text
//! prompt ──► backend ──► "Action: tool / Action Input: ..." ──► ToolBox ──► Observation ─┐
//!               ▲                                                                       │
//!               └───────────────────────────────────────────────────────────────────────┘
//!                        ...until "Final Answer: ..." or the iteration budget runs out
//! ```

use futures::future::{BoxFuture, FutureExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::role::{AgentProfile, AgentRole};
use super::template::{Placeholder, PromptTemplate, TemplateError, TemplateValues};
use crate::llm::LLMAdapter;
use crate::tools::{ToolBox, ToolId, ToolSet};
use crate::types::{AppError, LLMMessage, LLMRequest};

/// Pseudo-tool offered to roles that may delegate.
pub const DELEGATE_TOOL: &str = "delegate_work";

const FINAL_ANSWER: &str = "Final Answer:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";

#[derive(Debug, Error)]
pub enum ReasoningFailure {
    #[error("{role} exceeded its limit of {per_minute} invocations per minute")]
    RateLimited { role: AgentRole, per_minute: u32 },

    #[error("{role} did not reach a final answer within {max_iter} iterations")]
    IterationsExhausted { role: AgentRole, max_iter: u32 },

    #[error("{role} reasoning backend failed: {source}")]
    Backend {
        role: AgentRole,
        #[source]
        source: AppError,
    },

    #[error("{role} cannot be assigned tools outside its capability set: {tools}")]
    CapabilityMismatch { role: AgentRole, tools: String },
}

/// Model settings shared by every agent.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub provider: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl BackendSettings {
    pub fn from_config(config: &crate::config::LLMConfig) -> Self {
        Self {
            provider: config.default_provider.clone(),
            model: config.default_model.clone(),
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
        }
    }
}

/// What one invocation is asked to do.
#[derive(Debug, Clone, Copy)]
pub struct TaskBrief<'a> {
    pub description: &'a str,
    pub expected_output: &'a str,
    pub tools: ToolSet,
}

/// Run-scoped inputs visible to an invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunInputs<'a> {
    pub query: &'a str,
    pub document: &'a Path,
    /// Rendered outputs of earlier stages, if any.
    pub prior_context: Option<&'a str>,
}

#[derive(Debug, PartialEq, Eq)]
enum AgentStep {
    Final(String),
    Act { tool: String, input: String },
}

pub struct ReasoningAgent {
    profile: &'static AgentProfile,
    goal: PromptTemplate,
    backend: Arc<dyn LLMAdapter>,
    settings: BackendSettings,
    limiter: DefaultDirectRateLimiter,
}

impl ReasoningAgent {
    pub fn new(
        profile: &'static AgentProfile,
        backend: Arc<dyn LLMAdapter>,
        settings: BackendSettings,
    ) -> Result<Self, TemplateError> {
        let goal = PromptTemplate::parse(profile.goal, &[Placeholder::Query])?;
        let per_minute = NonZeroU32::new(profile.max_rpm).unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            profile,
            goal,
            backend,
            settings,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        })
    }

    pub fn role(&self) -> AgentRole {
        self.profile.role
    }

    pub fn profile(&self) -> &'static AgentProfile {
        self.profile
    }

    /// Run the reasoning loop. Boxed because delegation recurses into a
    /// coworker's loop.
    fn reason<'a>(
        &'a self,
        roster: &'a AgentRoster,
        brief: TaskBrief<'a>,
        inputs: RunInputs<'a>,
        may_delegate: bool,
    ) -> BoxFuture<'a, Result<String, ReasoningFailure>> {
        async move {
            let role = self.role();
            if !brief.tools.is_subset_of(self.profile.tools) {
                return Err(ReasoningFailure::CapabilityMismatch {
                    role,
                    tools: brief.tools.names().join(", "),
                });
            }

            let may_delegate = may_delegate && self.profile.allow_delegation;
            let mut messages = vec![
                LLMMessage::system(self.system_prompt(brief.tools, inputs, may_delegate)),
                LLMMessage::user(Self::task_prompt(brief, inputs)),
            ];

            let max_iter = self.profile.max_iter.max(1);
            for iteration in 1..=max_iter {
                if iteration == max_iter && iteration > 1 {
                    if let Some(last) = messages.last_mut() {
                        last.content.push_str(
                            "\n\nYou have reached your iteration limit. Reply now with your Final Answer.",
                        );
                    }
                }

                let reply = self.call_backend(&messages).await?;
                match parse_step(&reply) {
                    AgentStep::Final(answer) => {
                        if answer.is_empty() {
                            return Err(ReasoningFailure::Backend {
                                role,
                                source: AppError::LLMApi("empty response".to_string()),
                            });
                        }
                        info!(role = %role, iteration, output_len = answer.len(), "Agent produced final answer");
                        return Ok(answer);
                    }
                    AgentStep::Act { tool, input } => {
                        debug!(role = %role, iteration, tool = %tool, "Agent requested tool");
                        let observation = self
                            .act(roster, &tool, &input, brief.tools, inputs, may_delegate)
                            .await;
                        messages.push(LLMMessage::assistant(reply));
                        messages.push(LLMMessage::user(format!("Observation: {}", observation)));
                    }
                }
            }

            warn!(role = %role, max_iter, "Agent exhausted its iteration budget");
            Err(ReasoningFailure::IterationsExhausted { role, max_iter })
        }
        .boxed()
    }

    async fn call_backend(&self, messages: &[LLMMessage]) -> Result<String, ReasoningFailure> {
        let role = self.role();
        if self.limiter.check().is_err() {
            warn!(role = %role, per_minute = self.profile.max_rpm, "Agent rate limit reached");
            return Err(ReasoningFailure::RateLimited {
                role,
                per_minute: self.profile.max_rpm,
            });
        }

        let request = LLMRequest {
            provider: self.settings.provider.clone(),
            model: self.settings.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system_instruction: None,
        };

        self.backend
            .create_chat_completion(&request)
            .await
            .map(|response| response.content)
            .map_err(|source| ReasoningFailure::Backend { role, source })
    }

    async fn act(
        &self,
        roster: &AgentRoster,
        tool: &str,
        input: &str,
        allowed: ToolSet,
        inputs: RunInputs<'_>,
        may_delegate: bool,
    ) -> String {
        if tool == DELEGATE_TOOL {
            if !may_delegate {
                return format!(
                    "Tool '{}' is not available. Available tools: {}",
                    DELEGATE_TOOL,
                    allowed.names().join(", ")
                );
            }
            return self.delegate(roster, input, inputs).await;
        }

        match ToolId::from_name(tool) {
            Some(id) if allowed.contains(id) => roster.tools().run(id, input, inputs.document).await,
            _ => {
                warn!(role = %self.role(), tool = %tool, "Agent requested a tool outside its task");
                format!(
                    "Tool '{}' is not available. Available tools: {}",
                    tool,
                    allowed.names().join(", ")
                )
            }
        }
    }

    async fn delegate(&self, roster: &AgentRoster, input: &str, inputs: RunInputs<'_>) -> String {
        let Some((key, request)) = input.split_once(':') else {
            return format!(
                "Delegation input must look like '<coworker>: <request>'. Coworkers: {}",
                self.coworkers().join(", ")
            );
        };
        let coworker = match AgentRole::from_key(key) {
            Some(role) if role != self.role() => role,
            _ => {
                return format!(
                    "Unknown coworker '{}'. Coworkers: {}",
                    key.trim(),
                    self.coworkers().join(", ")
                )
            }
        };

        info!(from = %self.role(), to = %coworker, "Delegating work");
        let agent = roster.agent(coworker);
        let brief = TaskBrief {
            description: request.trim(),
            expected_output: "A concise, direct answer to the delegated request.",
            tools: agent.profile.tools,
        };
        match agent.reason(roster, brief, inputs, false).await {
            Ok(answer) => answer,
            Err(e) => format!("Delegation to {} failed: {}", coworker, e),
        }
    }

    fn coworkers(&self) -> Vec<&'static str> {
        AgentRole::ALL
            .into_iter()
            .filter(|role| *role != self.role())
            .map(AgentRole::key)
            .collect()
    }

    fn system_prompt(&self, tools: ToolSet, inputs: RunInputs<'_>, may_delegate: bool) -> String {
        let goal = self.goal.render(&TemplateValues {
            query: inputs.query,
            file_path: &inputs.document.display().to_string(),
        });

        let mut prompt = format!(
            "You are {}.\n{}\n\nYour personal goal is: {}\n\nYou have access to the following tools:\n",
            self.profile.title, self.profile.backstory, goal
        );
        for tool in tools.iter() {
            prompt.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
        }
        if may_delegate {
            prompt.push_str(&format!(
                "- {}: Ask a coworker for help. Input: '<coworker>: <request>'. Coworkers: {}\n",
                DELEGATE_TOOL,
                self.coworkers().join(", ")
            ));
        }
        prompt.push_str(
            "\nTo use a tool, reply with exactly:\n\
             Thought: <your reasoning>\n\
             Action: <tool name>\n\
             Action Input: <tool input>\n\n\
             When you are done, reply with:\n\
             Final Answer: <your complete answer>",
        );
        prompt
    }

    fn task_prompt(brief: TaskBrief<'_>, inputs: RunInputs<'_>) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}",
            brief.description, brief.expected_output
        );
        if let Some(context) = inputs.prior_context {
            prompt.push_str("\n\nContext from earlier stages:\n");
            prompt.push_str(context);
        }
        prompt
    }
}

fn parse_step(reply: &str) -> AgentStep {
    if let Some(idx) = reply.find(FINAL_ANSWER) {
        return AgentStep::Final(reply[idx + FINAL_ANSWER.len()..].trim().to_string());
    }

    let action = reply
        .lines()
        .find_map(|line| line.trim().strip_prefix(ACTION))
        .map(|tool| tool.trim().trim_matches('`').to_string());

    match action {
        Some(tool) if !tool.is_empty() => {
            let input = reply
                .find(ACTION_INPUT)
                .map(|idx| reply[idx + ACTION_INPUT.len()..].trim())
                .unwrap_or("")
                .trim_matches('"')
                .to_string();
            AgentStep::Act { tool, input }
        }
        _ => AgentStep::Final(reply.trim().to_string()),
    }
}

/// Every agent the service runs, plus the tools they share.
/// Constructed once at startup.
pub struct AgentRoster {
    agents: Vec<ReasoningAgent>,
    tools: ToolBox,
}

impl AgentRoster {
    pub fn new(
        backend: Arc<dyn LLMAdapter>,
        settings: BackendSettings,
        tools: ToolBox,
    ) -> Result<Self, TemplateError> {
        let mut by_slot: Vec<AgentRole> = AgentRole::ALL.to_vec();
        by_slot.sort_by_key(|role| role.slot());

        let agents = by_slot
            .into_iter()
            .map(|role| ReasoningAgent::new(role.profile(), Arc::clone(&backend), settings.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { agents, tools })
    }

    pub fn agent(&self, role: AgentRole) -> &ReasoningAgent {
        &self.agents[role.slot()]
    }

    pub fn tools(&self) -> &ToolBox {
        &self.tools
    }

    /// Invoke `role` on one task.
    pub async fn invoke(
        &self,
        role: AgentRole,
        brief: TaskBrief<'_>,
        inputs: RunInputs<'_>,
    ) -> Result<String, ReasoningFailure> {
        self.agent(role).reason(self, brief, inputs, true).await
    }
}
