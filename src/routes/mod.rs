//! API Routes
//!
//! - `GET /` - Liveness banner
//! - `GET /health` - Service description (agents, analysis modes)
//! - `POST /analyze` - Upload a blood test PDF and run the analysis pipeline

pub mod analyze;
pub mod error;
pub mod health;

pub use error::ApiError;

use axum::Router;
use tracing::info;

use crate::models::AppState;

/// Create the application router. Cross-cutting layers (CORS, tracing)
/// are added by [`crate::middleware::apply`].
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    Router::new()
        .merge(health::router())
        .merge(analyze::router(state))
}
