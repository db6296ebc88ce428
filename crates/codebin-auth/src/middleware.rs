//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, JwtManager};

/// Authenticated user information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        let id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(Self { id })
    }
}

/// Extract bearer token from authorization header
///
/// The value must be exactly two space-separated parts, the first being
/// the literal scheme `Bearer`.
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Authenticate a request from its authorization header value
pub fn authenticate(
    header: Option<&str>,
    jwt: &JwtManager,
    now: DateTime<Utc>,
) -> Result<AuthUser, AuthError> {
    let header = header
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingAuthHeader)?;
    let token = extract_bearer_token(header)?;
    let claims = jwt.validate_token_at(token, now)?;
    AuthUser::from_claims(&claims)
}

/// Authentication middleware
///
/// Rejects the request unless it carries a valid bearer token, and adds
/// the AuthUser to request extensions for the handler.
pub async fn auth_middleware(
    State(jwt_manager): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?),
        None => None,
    };

    let user = authenticate(auth_header, &jwt_manager, Utc::now()).inspect_err(|e| {
        debug!("Rejected request to {}: {}", request.uri().path(), e);
    })?;

    debug!("Authenticated user: {}", user.id);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
