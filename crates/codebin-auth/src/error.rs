//! Authentication error types

use axum::http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use axum::response::{IntoResponse, Response};
use codebin_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Generic message for faults whose cause must stay internal
pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Email address is already registered")]
    EmailTaken,

    #[error("Invalid auth configuration: {0}")]
    Configuration(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl AuthError {
    /// Whether the error concerns the presented bearer token
    fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::InvalidAuthHeader
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid authentication credentials".to_string())
            }
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "invalid or missing authentication token".to_string(),
            ),
            AuthError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "you must be authenticated to access this resource".to_string(),
            ),
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::EmailTaken => (
                StatusCode::CONFLICT,
                "a user with this email address already exists".to_string(),
            ),
            AuthError::Configuration(_)
            | AuthError::PasswordHash(_)
            | AuthError::Jwt(_)
            | AuthError::Database(_) => {
                error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE.to_string())
            }
        };

        let body = axum::Json(json!({
            "error": message
        }));

        let mut response = (status, body).into_response();
        if self.is_token_error() {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_carry_challenge() {
        for err in [AuthError::InvalidToken, AuthError::TokenExpired, AuthError::InvalidAuthHeader] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
        }
    }

    #[test]
    fn test_missing_header_has_no_challenge() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Validation("email is required".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::EmailTaken.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::PasswordHash("rng".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
