// Cross-cutting HTTP layers: CORS and request tracing

pub mod cors;

pub use cors::*;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub fn apply(router: Router, server: &ServerConfig) -> Router {
    apply_cors(router, &server.cors_allowed_origins).layer(TraceLayer::new_for_http())
}
