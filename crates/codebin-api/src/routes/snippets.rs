//! Snippet endpoints

use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use codebin_auth::{AuthUser, JwtManager, auth_middleware};
use codebin_db::Snippet;
use std::sync::Arc;
use tracing::debug;

use super::types::CreateSnippetRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /snippets/{id}
async fn get_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Snippet>, ApiError> {
    let snippet = state.snippets.get_snippet(&id).await?;
    Ok(Json(snippet))
}

/// GET /snippets
async fn latest_snippets(State(state): State<AppState>) -> Result<Json<Vec<Snippet>>, ApiError> {
    let snippets = state.snippets.latest_snippets().await?;
    Ok(Json(snippets))
}

/// POST /snippets
async fn create_snippet(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateSnippetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let snippet = state
        .snippets
        .create_snippet(&request.title, &request.content)
        .await?;

    debug!("Snippet {} owned by user {}", snippet.id, user.id);

    let location = format!("/snippets/{}", snippet.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(snippet),
    ))
}

/// Create snippet routes. Creation requires a bearer token.
pub fn routes(jwt: Arc<JwtManager>) -> Router<AppState> {
    let create = post(create_snippet).route_layer(middleware::from_fn_with_state(jwt, auth_middleware));

    Router::new()
        .route("/snippets", get(latest_snippets).merge(create))
        .route("/snippets/{id}", get(get_snippet))
}
