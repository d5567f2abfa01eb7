use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::pipeline::Orchestrator;

/// Query used when the caller sends none, or only whitespace.
pub const DEFAULT_QUERY: &str = "Provide a comprehensive analysis of my blood test report";

pub const DEFAULT_ANALYSIS_TYPE: &str = "comprehensive";

pub const DISCLAIMER: &str = "This analysis is for educational purposes only and should not replace \
    professional medical advice. Please consult with your healthcare provider for medical decisions.";

pub const SERVICE_NAME: &str = "Blood Test Analyzer";
pub const API_VERSION: &str = "1.0.0";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub upload: UploadConfig,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, upload: UploadConfig) -> Self {
        Self {
            orchestrator,
            upload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub agents_available: Vec<String>,
    pub analysis_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub query: String,
    pub analysis_type: String,
    pub analysis: String,
    pub file_processed: String,
    pub disclaimer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
