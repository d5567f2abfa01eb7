//! Agent System
//!
//! The four specialist roles that analyze a blood test report:
//!
//! - **Verifier**: checks the upload is a plausible lab report
//! - **Doctor**: interprets the results (may delegate to coworkers)
//! - **Nutritionist**: dietary recommendations
//! - **Exercise Specialist**: exercise plan
//!
//! Roles, goals and capability sets are static ([`role`]). At startup they
//! are paired with the reasoning backend into an [`AgentRoster`], which the
//! pipeline orchestrator drives one task at a time.

pub mod agent;
pub mod role;
pub mod template;

pub use agent::{AgentRoster, BackendSettings, ReasoningAgent, ReasoningFailure, RunInputs, TaskBrief};
pub use role::{AgentProfile, AgentRole};
pub use template::{Placeholder, PromptTemplate, TemplateError, TemplateValues};
