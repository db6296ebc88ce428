//! Application state

use codebin_auth::{AuthService, JwtManager};
use codebin_core::SnippetService;
use std::sync::Arc;

/// Handle used to render Prometheus metrics
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub snippets: Arc<SnippetService>,
    pub auth: AuthService,
    pub environment: String,
}

impl AppState {
    pub fn new(snippets: Arc<SnippetService>, auth: AuthService, environment: String) -> Self {
        Self {
            snippets,
            auth,
            environment,
        }
    }

    pub fn jwt(&self) -> Arc<JwtManager> {
        self.auth.jwt().clone()
    }
}
