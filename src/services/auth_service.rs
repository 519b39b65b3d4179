//! Domain service for authentication.
//!
//! Handles registration, credential login, access token verification, and
//! refresh token rotation.

use serde::Serialize;
use thiserror::Error;

use crate::domain::Role;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One message for both unknown username and wrong password; the API
    /// must not reveal which one it was.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Username already exists")]
    DuplicateUser,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Authenticated caller, attached to requests by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

/// Result of a successful login or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_minutes: i64,
    pub role: Role,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account with role [`Role::User`]. Callers cannot choose
    /// a role at registration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicateUser`] if the username is taken.
    async fn register(&self, username: &str, email: &str, password: &str)
    -> Result<(), AuthError>;

    /// Verifies credentials and issues a fresh token pair, overwriting any
    /// previously stored refresh token.
    async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Rotates a refresh token: the presented token is consumed and a new
    /// pair is issued.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidRefreshToken`] if no user holds the token
    /// or its stored expiry has passed.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Verifies a bearer access token and resolves the live account behind it.
    async fn authenticate(&self, access_token: &str) -> Result<CurrentUser, AuthError>;
}
