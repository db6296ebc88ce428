//! API error types

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use codebin_auth::AuthError;
use codebin_auth::error::SERVER_ERROR_MESSAGE;
use codebin_core::CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = axum::Json(json!({
        "error": message
    }));
    (status, body).into_response()
}

pub(crate) async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
            ApiError::Core(CoreError::Validation(msg)) => {
                error_response(StatusCode::BAD_REQUEST, &msg)
            }
            ApiError::Core(CoreError::NotFound(_)) => {
                error_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
            }
            ApiError::Core(e @ CoreError::Database(_)) => {
                error!("{}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
            }
            ApiError::Auth(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codebin_db::DbError;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_store_fault_is_opaque() {
        let err = ApiError::Core(CoreError::Database(DbError::Duplicate("secret detail".into())));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body["error"], SERVER_ERROR_MESSAGE);
        assert!(!body.to_string().contains("secret detail"));
    }

    #[tokio::test]
    async fn test_not_found_and_validation() {
        let response = ApiError::Core(CoreError::NotFound("snippet 'x'".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await["error"], NOT_FOUND_MESSAGE);

        let response =
            ApiError::Core(CoreError::Validation("title must be provided".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await["error"], "title must be provided");
    }
}
