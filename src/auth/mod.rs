pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::authz::{AuthzError, Principal, Role, TenantId};
use crate::config::SecurityConfig;
use crate::database::models::User;

pub use password::{hash_password, verify_password, PasswordError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_user(user: &User, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();
        Self {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            school_id: user.school_id,
            exp,
            iat: now.timestamp(),
        }
    }

    /// Fails for a tenant administrator without a school.
    pub fn principal(&self) -> Result<Principal, AuthzError> {
        Principal::new(self.role, self.school_id.map(TenantId), self.sub)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

/// HS256 signing and verification with the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    expiry_hours: u64,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self { secret: secret.into(), expiry_hours }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    pub fn issue(&self, user: &User) -> Result<String, JwtError> {
        self.generate(&Claims::for_user(user, self.expiry_hours))
    }

    pub fn generate(&self, claims: &Claims) -> Result<String, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        decode::<Claims>(token, &decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").field("expiry_hours", &self.expiry_hours).finish_non_exhaustive()
    }
}
