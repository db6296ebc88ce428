//! Login and registration flows

use codebin_db::{DbError, NewUser, User, UserStore};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::jwt::JwtManager;
use crate::password::{DUMMY_HASH, hash_password, verify_password};

// ==================== Input Validation ====================

/// Maximum allowed display name length
const MAX_NAME_LENGTH: usize = 100;
/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

fn require_non_empty(field: &str, value: &str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::Validation(format!("{} must be provided", field)));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_name(name: &str) -> Result<(), AuthError> {
    require_non_empty("name", name)?;
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "name must not be more than {} characters long",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    require_non_empty("email", email)?;
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AuthError::Validation(format!(
            "email must not be more than {} characters long",
            MAX_EMAIL_LENGTH
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(AuthError::Validation("email must be a valid email address".to_string())),
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    require_non_empty("password", password)?;
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at least {} bytes long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must not be more than {} bytes long",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Service ====================

/// Account operations over a user store
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: Arc<JwtManager>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: Arc<JwtManager>) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &Arc<JwtManager> {
        &self.jwt
    }

    /// Register a new user
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);
        validate_name(name)?;
        validate_email(&email)?;
        validate_password(password)?;

        debug!("Registering user: {}", email);

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

        let user = self
            .users
            .insert_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                DbError::Duplicate(_) => AuthError::EmailTaken,
                other => AuthError::Database(other),
            })?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials and issue a session token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        require_non_empty("email", &email)?;
        require_non_empty("password", password)?;
        if password.len() > MAX_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "password must not be more than {} bytes long",
                MAX_PASSWORD_LENGTH
            )));
        }

        debug!("Login attempt for user: {}", email);

        // Find user - but don't return early to prevent timing attacks
        let user = self.users.get_user_by_email(&email).await?;

        let hash_to_verify = match &user {
            Some(u) => u.password_hash.clone(),
            None => DUMMY_HASH.to_string(),
        };
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &hash_to_verify))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        let user = match (user, matched) {
            (Some(u), true) => u,
            _ => {
                metrics::counter!("codebin_logins_total", "outcome" => "rejected").increment(1);
                debug!("Login rejected for user: {}", email);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.jwt.generate_token(user.id)?;

        metrics::counter!("codebin_logins_total", "outcome" => "success").increment(1);
        info!("User {} logged in successfully", user.id);

        Ok(token)
    }
}
