//! Access token issuing and verification.
//!
//! Access tokens are HS256 JWTs carrying the username, user id, and role.
//! Refresh tokens are opaque random strings with no embedded claims; their
//! validity is decided solely by the database lookup.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::Role;
use crate::entities::users;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// User id
    pub id: i32,
    pub role: Role,
    /// Expiration timestamp
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, access_token_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
        }
    }

    #[must_use]
    pub const fn access_token_minutes(&self) -> i64 {
        self.access_token_minutes
    }

    pub fn issue_access_token(&self, user: &users::Model, role: Role) -> Result<String> {
        let exp = chrono::Utc::now() + chrono::Duration::minutes(self.access_token_minutes);

        let claims = Claims {
            sub: user.username.clone(),
            id: user.id,
            role,
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verifies signature and expiry, returning the claims.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

/// Generate an opaque refresh token (64 character hex string)
#[must_use]
pub fn generate_refresh_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> users::Model {
        users::Model {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            role: "User".to_string(),
            refresh_token: None,
            refresh_token_expires_at: None,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_issue_and_decode_token() {
        let issuer = TokenIssuer::new("test_secret_key", 15);
        let token = issuer
            .issue_access_token(&sample_user(), Role::User)
            .unwrap();

        let claims = issuer.decode_access_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new("test_secret_key", 15);
        assert!(issuer.decode_access_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let issuer1 = TokenIssuer::new("secret1", 15);
        let issuer2 = TokenIssuer::new("secret2", 15);

        let token = issuer1
            .issue_access_token(&sample_user(), Role::Admin)
            .unwrap();

        assert!(issuer2.decode_access_token(&token).is_err());
    }

    #[test]
    fn test_expiry_claim_window() {
        let issuer = TokenIssuer::new("test_secret_key", 15);
        let token = issuer
            .issue_access_token(&sample_user(), Role::User)
            .unwrap();

        let claims = issuer.decode_access_token(&token).unwrap();
        let expires_in = claims.exp - chrono::Utc::now().timestamp();
        assert!(expires_in > 14 * 60);
        assert!(expires_in <= 15 * 60);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
