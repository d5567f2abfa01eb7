// Bloodwork Analyzer - multi-agent blood test report analysis service

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // SerpAPI web search (External Knowledge Lookup)
pub mod tools;
pub mod pipeline;
pub mod routes;
pub mod middleware;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use agents::{AgentRoster, BackendSettings};
use llm::{LLMProviderConfig, LLM};
use pipeline::{Orchestrator, TaskBook};
use search::SerpApiClient;
use tools::ToolBox;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

/// Build the process-wide agent roster, task book and orchestrator.
/// Fails when a credential is missing or a prompt template is malformed.
pub fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let api_key = config.llm.active_api_key().unwrap_or_default();
    let llm = LLM::new(LLMProviderConfig {
        name: config.llm.default_provider.clone(),
        api_key,
    })
    .context("Failed to initialize reasoning backend")?;
    info!(provider = %llm.provider(), model = %config.llm.default_model, "Reasoning backend ready");

    let search = SerpApiClient::from_config(&config.search)
        .context("SERPAPI_API_KEY is required for web search")?;
    let tools = ToolBox::new(Arc::new(search));

    let roster = AgentRoster::new(llm.adapter(), BackendSettings::from_config(&config.llm), tools)
        .context("Invalid agent goal template")?;
    let tasks = TaskBook::new().context("Invalid task description template")?;
    info!("Agent roster and task book initialized");

    Ok(Orchestrator::new(Arc::new(roster), Arc::new(tasks)))
}
