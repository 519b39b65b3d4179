//! `SeaORM` implementation of the `AuthService` trait.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::{NewUser, Store};
use crate::domain::Role;
use crate::entities::users;
use crate::services::auth_service::{AuthError, AuthService, CurrentUser, TokenPair};
use crate::services::event_log::EventLogService;
use crate::services::password;
use crate::services::token::{TokenIssuer, generate_refresh_token};

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenIssuer,
    events: Arc<EventLogService>,
    security: SecurityConfig,
    refresh_token_days: i64,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        auth_config: &AuthConfig,
        security: SecurityConfig,
        events: Arc<EventLogService>,
    ) -> Self {
        Self {
            store,
            tokens: TokenIssuer::new(&auth_config.jwt_secret, auth_config.access_token_minutes),
            events,
            security,
            refresh_token_days: auth_config.refresh_token_days,
        }
    }

    fn role_of(user: &users::Model) -> Result<Role, AuthError> {
        Role::from_str(&user.role)
            .map_err(|()| AuthError::Internal(format!("Unknown role in database: {}", user.role)))
    }

    /// Issues a new pair and overwrites the user's refresh slot.
    /// Last write wins under concurrent logins or refreshes.
    async fn issue_pair(&self, user: &users::Model, role: Role) -> Result<TokenPair, AuthError> {
        let access_token = self.tokens.issue_access_token(user, role)?;
        let refresh_token = generate_refresh_token();
        let expires_at =
            (chrono::Utc::now() + chrono::Duration::days(self.refresh_token_days)).to_rfc3339();

        self.store
            .set_refresh_token(user.id, Some(refresh_token.clone()), Some(expires_at))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in_minutes: self.tokens.access_token_minutes(),
            role,
        })
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if email.trim().is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = password::hash_async(password, Some(&self.security)).await?;

        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::User.as_str().to_string(),
            })
            .await?;

        if let Err(e) = self
            .events
            .log_event(
                "User Registration",
                &format!("User {username} registered"),
                Some(user.id),
            )
            .await
        {
            warn!(error = %e, "Failed to record registration event");
        }

        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        if !password::verify_async(password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let role = Self::role_of(&user)?;
        let pair = self.issue_pair(&user, role).await?;

        if let Err(e) = self
            .events
            .log_event(
                "User Interaction",
                &format!("User {username} logged in"),
                Some(user.id),
            )
            .await
        {
            warn!(error = %e, "Failed to record login event");
        }

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.store.get_user_by_refresh_token(refresh_token).await? else {
            return Err(AuthError::InvalidRefreshToken);
        };

        let expired = match user.refresh_token_expires_at.as_deref() {
            Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
                .map(|expiry| expiry <= chrono::Utc::now())
                .unwrap_or(true),
            None => true,
        };

        if expired || !user.is_active {
            return Err(AuthError::InvalidRefreshToken);
        }

        let role = Self::role_of(&user)?;
        // Rotation: writing the new token invalidates the presented one.
        self.issue_pair(&user, role).await
    }

    async fn authenticate(&self, access_token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self
            .tokens
            .decode_access_token(access_token)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let Some(user) = self.store.get_user_by_username(&claims.sub).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let role = Self::role_of(&user)?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            role,
        })
    }
}
