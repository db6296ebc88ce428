//! Health check endpoint

use axum::{Json, Router, extract::State, routing::get};
use codebin_core::CacheStats;
use serde::Serialize;

use crate::state::AppState;

/// Health status response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub version: String,
    pub cache: CacheStats,
}

async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("codebin_health_checks_total").increment(1);

    Json(HealthResponse {
        status: "available".to_string(),
        environment: state.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: state.snippets.cache().stats(),
    })
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/healthcheck", get(healthcheck))
}
