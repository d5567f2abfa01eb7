//! Search Module
//!
//! External knowledge lookup used by the `search_web` agent tool.
//! Uses SerpAPI as the backend.

pub mod serpapi;

pub use serpapi::{SerpApiClient, WebResult};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("SerpAPI key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("No results found for query")]
    NoResults,
}

/// Read-only reference lookup shared by every pipeline run.
#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<String, SearchError>;
}
