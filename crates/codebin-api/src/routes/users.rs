//! Account endpoints

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use codebin_db::User;

use super::types::{LoginRequest, RegisterRequest, TokenResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /users
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(request) = payload?;
    let user = state
        .auth
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /tokens/authentication
async fn create_token(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(request) = payload?;
    let token = state.auth.login(&request.email, &request.password).await?;

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            token,
            expires_in: state.auth.jwt().expires_in(),
        }),
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/tokens/authentication", post(create_token))
}
