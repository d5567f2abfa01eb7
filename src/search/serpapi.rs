//! SerpAPI Client
//!
//! Backs the agents' `search_web` tool with Google results fetched through
//! SerpAPI. Results are filtered towards reliable medical sources and
//! rendered as plain reference text for the reasoning agents.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{KnowledgeLookup, SearchError};

const SERPAPI_BASE: &str = "https://serpapi.com";

/// Result from a Google web search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResult {
    /// Title of the result
    pub title: String,
    /// Snippet/description
    pub snippet: String,
    /// URL link
    pub link: String,
    /// Source domain
    pub source: Option<String>,
}

/// SerpAPI client for medical reference lookups
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl SerpApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: SERPAPI_BASE.to_string(),
            max_results: 5,
        }
    }

    /// Configure client from config. `None` when no key is set.
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(config.serpapi_key.clone()).with_max_results(config.max_results))
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max.max(1);
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Search Google for general medical reference material
    pub async fn search_google(&self, query: &str) -> Result<Vec<WebResult>, SearchError> {
        if self.api_key.trim().is_empty() {
            return Err(SearchError::NoApiKey);
        }

        info!(query = %query, "Searching Google via SerpAPI");

        let num = self.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("hl", "en"),
                ("gl", "us"),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::RequestFailed(format!("{}: {}", status, body)));
        }

        let results: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        debug!("Raw Google response received");

        if let Some(error) = results.get("error").and_then(|v| v.as_str()) {
            return Err(SearchError::RequestFailed(error.to_string()));
        }

        let results_array = results
            .get("organic_results")
            .ok_or(SearchError::NoResults)?
            .as_array()
            .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

        if results_array.is_empty() {
            return Err(SearchError::NoResults);
        }

        let web_results: Vec<WebResult> = results_array
            .iter()
            .take(self.max_results)
            .map(|result| {
                let link = result
                    .get("link")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                WebResult {
                    title: result
                        .get("title")
                        .and_then(|v| v.as_str())
                        .unwrap_or("Untitled")
                        .to_string(),
                    snippet: result
                        .get("snippet")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    source: result
                        .get("source")
                        .and_then(|v| v.as_str())
                        .map(String::from)
                        .or_else(|| link.split('/').nth(2).map(String::from)),
                    link,
                }
            })
            .collect();

        info!(count = web_results.len(), "Google search completed");
        Ok(web_results)
    }
}

#[async_trait]
impl KnowledgeLookup for SerpApiClient {
    async fn lookup(&self, query: &str) -> Result<String, SearchError> {
        let results = self.search_google(query).await?;

        // Prefer reliable sources, but keep everything if none qualify.
        let (reliable, other): (Vec<_>, Vec<_>) = results
            .into_iter()
            .partition(|r| is_reliable_source(&r.link));
        let chosen = if reliable.is_empty() { other } else { reliable };

        Ok(format_results(query, &chosen))
    }
}

/// Render results as reference text for an agent observation
pub fn format_results(query: &str, results: &[WebResult]) -> String {
    let mut output = format!("Search results for \"{}\":\n", query);
    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, result.title));
        if !result.snippet.is_empty() {
            output.push_str(&format!("   {}\n", result.snippet));
        }
        if !result.link.is_empty() {
            output.push_str(&format!("   Source: {}\n", result.link));
        }
    }
    output
}

/// Check if a URL is from a reliable medical source
fn is_reliable_source(url: &str) -> bool {
    let reliable_domains = [
        "pubmed.ncbi.nlm.nih.gov",
        "ncbi.nlm.nih.gov",
        "nih.gov",
        "medlineplus.gov",
        "mayoclinic.org",
        "clevelandclinic.org",
        "webmd.com",
        "heart.org",
        "diabetes.org",
        "who.int",
        "cdc.gov",
        "nhs.uk",
        "nature.com",
        "thelancet.com",
        "bmj.com",
        "jamanetwork.com",
        ".edu",
        ".gov",
    ];

    let url_lower = url.to_lowercase();
    reliable_domains.iter().any(|domain| url_lower.contains(domain))
}
