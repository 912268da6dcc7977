use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, JwtKeys, PasswordError};
use crate::authz::{AuthzEngine, AuthzError, DenyReason, Principal, Role, TenantId};
use crate::config::SeedConfig;
use crate::database::models::{User, UserProfile};
use crate::database::{DatabaseError, Document, Store};
use crate::filter::FilterData;

use super::error::{ServiceError, ServiceResult};
use super::validate::{normalize_email, Validator};

const EMAIL_IN_USE: &str = "email already in use";
const USERNAME_IN_USE: &str = "username already in use";
const INVALID_CREDENTIALS: &str = "invalid credentials";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user together with a freshly issued token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
}

pub struct UserService {
    engine: Arc<AuthzEngine>,
    store: Store,
    keys: JwtKeys,
}

impl UserService {
    pub fn new(engine: Arc<AuthzEngine>, store: Store, keys: JwtKeys) -> Self {
        Self { engine, store, keys }
    }

    /// Creates an administrator account. Only a global administrator may
    /// create accounts; a school administrator must belong to an active school.
    pub async fn create(&self, principal: &Principal, input: CreateUser) -> ServiceResult<AuthSession> {
        if !principal.is_global_admin() {
            tracing::warn!("User {} may not create accounts", principal.user_id());
            return Err(AuthzError::Forbidden(DenyReason::ExceedsOwnerPrivilege).into());
        }

        let mut validator = Validator::new();
        validator
            .username(input.username.as_deref(), true)
            .email(input.email.as_deref(), true)
            .password(input.password.as_deref(), true)
            .role(input.role.as_deref(), true);
        let role = input.role.as_deref().and_then(|r| r.parse::<Role>().ok());
        if role == Some(Role::TenantAdmin) && input.school_id.is_none() {
            validator.require_field("school_id", "school_id is required for school_admin");
        }
        validator.finish()?;

        let role = role.ok_or_else(|| AuthzError::UnknownRole(input.role.clone().unwrap_or_default()))?;
        let school = match role {
            Role::TenantAdmin => input.school_id.map(TenantId),
            Role::GlobalAdmin => None,
        };
        if let Some(tenant) = school {
            self.engine
                .check_parentage(tenant, tenant.as_uuid(), &self.store.school_lookup())
                .await?;
        }

        let username = input.username.unwrap_or_default().trim().to_string();
        let email = normalize_email(input.email.as_deref().unwrap_or_default());
        self.ensure_unique("email", &email, EMAIL_IN_USE).await?;
        self.ensure_unique("username", &username, USERNAME_IN_USE).await?;

        let password_hash = hash_blocking(input.password.unwrap_or_default()).await?;
        let user = self
            .store
            .users
            .insert(User::new(username, email, password_hash, role, school))
            .await
            .map_err(user_conflict)?;
        tracing::info!("User {} created {} account {}", principal.user_id(), user.role, user.id);

        self.session(&user)
    }

    /// Exchanges an email and password for a token.
    pub async fn login(&self, input: LoginRequest) -> ServiceResult<AuthSession> {
        Validator::new()
            .email(input.email.as_deref(), true)
            .password_present(input.password.as_deref())
            .finish()?;

        let email = normalize_email(input.email.as_deref().unwrap_or_default());
        let mut filter = User::filter(FilterData::with_where(json!({ "email": email })))?;
        filter.include_inactive(true);

        let Some(user) = self.store.users.select_one(filter).await? else {
            tracing::warn!("Login failed for unknown email {}", email);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !user.is_active {
            tracing::warn!("Login refused for inactive user {}", user.id);
            return Err(ServiceError::Forbidden("account is inactive".to_string()));
        }

        let password = input.password.unwrap_or_default();
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        if !verified {
            tracing::warn!("Login failed for user {}: wrong password", user.id);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!("User {} logged in", user.id);
        self.session(&user)
    }

    /// The caller's own account.
    pub async fn profile(&self, principal: &Principal) -> ServiceResult<UserProfile> {
        self.find_active(principal.user_id())
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| ServiceError::not_found("user"))
    }

    pub async fn find_active(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.store.users.find_by_id(id).await?)
    }

    /// Creates the initial superadmin unless one already exists. Returns the
    /// new account, or `None` when nothing was seeded.
    pub async fn seed_superadmin(&self, seed: &SeedConfig) -> ServiceResult<Option<User>> {
        let mut existing = User::filter(FilterData::with_where(json!({ "role": Role::GlobalAdmin.as_str() })))?;
        existing.include_inactive(true);
        if self.store.users.count(existing).await? > 0 {
            tracing::info!("Superadmin already present, skipping seed");
            return Ok(None);
        }

        Validator::new()
            .username(Some(&seed.username), true)
            .email(Some(&seed.email), true)
            .password(Some(&seed.password), true)
            .finish()?;

        let password_hash = hash_blocking(seed.password.clone()).await?;
        let user = User::new(
            seed.username.trim().to_string(),
            normalize_email(&seed.email),
            password_hash,
            Role::GlobalAdmin,
            None,
        );
        let user = self.store.users.insert(user).await.map_err(user_conflict)?;
        tracing::info!("Seeded superadmin {} ({})", user.username, user.id);
        Ok(Some(user))
    }

    fn session(&self, user: &User) -> ServiceResult<AuthSession> {
        Ok(AuthSession {
            user: UserProfile::from(user),
            token: self.keys.issue(user)?,
        })
    }

    async fn ensure_unique(&self, field: &str, value: &str, message: &str) -> ServiceResult<()> {
        let mut filter = User::filter(FilterData::with_where(json!({ field: value })))?;
        filter.include_inactive(true);
        if self.store.users.count(filter).await? > 0 {
            return Err(ServiceError::Conflict(message.to_string()));
        }
        Ok(())
    }
}

async fn hash_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))?
}

fn user_conflict(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::UniqueViolation(key) if key.contains("username") => {
            ServiceError::Conflict(USERNAME_IN_USE.to_string())
        }
        DatabaseError::UniqueViolation(_) => ServiceError::Conflict(EMAIL_IN_USE.to_string()),
        other => other.into(),
    }
}
