use axum::{routing::get, Json, Router};

use crate::agents::AgentRole;
use crate::models::{HealthResponse, RootResponse, API_VERSION, SERVICE_NAME};
use crate::pipeline::AnalysisMode;

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Professional Blood Test Report Analyzer API is running".to_string(),
        version: API_VERSION.to_string(),
        status: "healthy".to_string(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        agents_available: AgentRole::ALL.iter().map(|role| role.key().to_string()).collect(),
        analysis_types: AnalysisMode::ALL.iter().map(|mode| mode.name().to_string()).collect(),
    })
}
