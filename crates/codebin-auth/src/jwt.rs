//! JWT token management
//!
//! Tokens are stateless HS256 JWTs. Expiry is checked against a caller
//! supplied instant rather than the library's own clock, so the `*_at`
//! variants are deterministic under test.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: Duration,
}

impl JwtManager {
    /// Create a new JWT manager
    ///
    /// An empty secret or a non-positive lifetime is a configuration error.
    pub fn new(secret: &str, token_expiry_hours: i64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration("JWT secret must not be empty".to_string()));
        }
        if token_expiry_hours <= 0 {
            return Err(AuthError::Configuration(format!(
                "token expiry must be positive, got {} hours",
                token_expiry_hours
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_expiry: Duration::hours(token_expiry_hours),
        })
    }

    /// Token lifetime in seconds
    pub fn expires_in(&self) -> i64 {
        self.token_expiry.num_seconds()
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user_id: i64) -> Result<String, AuthError> {
        self.generate_token_at(user_id, Utc::now())
    }

    /// Generate a JWT token for a user as of `now`
    pub fn generate_token_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat + self.token_expiry.num_seconds(),
        };

        debug!("Generating token for user: {}", user_id);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate a JWT token and return claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate a JWT token as of `now`
    ///
    /// Any structural, algorithm or signature failure is `InvalidToken`;
    /// a well-signed token with `now >= exp` is `TokenExpired`.
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected token: {:?}", e.kind());
                AuthError::InvalidToken
            })?;

        if now.timestamp() >= token_data.claims.exp {
            debug!("Rejected token for user {}: expired", token_data.claims.sub);
            return Err(AuthError::TokenExpired);
        }

        Ok(token_data.claims)
    }
}
