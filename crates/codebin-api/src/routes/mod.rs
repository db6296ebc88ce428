//! API routes

mod health;
pub mod metrics;
mod snippets;
mod types;
mod users;

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use codebin_auth::error::SERVER_ERROR_MESSAGE;
use serde_json::json;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{Level, error};

use crate::error::not_found;
use crate::state::{AppState, MetricsHandle};

pub use types::{CreateSnippetRequest, LoginRequest, RegisterRequest, TokenResponse};

/// Turn a handler panic into the generic 500 envelope and close the connection
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONNECTION, "close")],
        Json(json!({ "error": SERVER_ERROR_MESSAGE })),
    )
        .into_response()
}

/// Create the main router
pub fn create_router(
    state: AppState,
    metrics_handle: Option<Arc<MetricsHandle>>,
    static_dir: Option<&Path>,
) -> Router {
    let jwt = state.jwt();
    let mut router = Router::new()
        .merge(health::routes())
        .merge(snippets::routes(jwt))
        .merge(users::routes())
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    // Static files last so they never shadow API routes
    router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found),
    };

    // Request span at INFO so handler errors carry method and uri
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn test_panic_becomes_generic_500() {
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "close");

        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], SERVER_ERROR_MESSAGE);
    }
}
