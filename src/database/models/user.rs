use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{AuthzError, Principal, Role, TenantId};
use crate::database::repository::{Document, UniqueKey};

/// Stored account. `password_hash` is persisted but never sent to clients;
/// handlers return `UserProfile` instead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub school_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String, role: Role, school_id: Option<TenantId>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role,
            // Global administrators belong to no school.
            school_id: match role {
                Role::GlobalAdmin => None,
                Role::TenantAdmin => school_id.map(|t| t.as_uuid()),
            },
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn principal(&self) -> Result<Principal, AuthzError> {
        Principal::new(self.role, self.school_id.map(TenantId), self.id)
    }
}

impl Document for User {
    const TABLE: &'static str = "users";
    const TENANT_FIELD: &'static str = "school_id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::global("email", &self.email), UniqueKey::global("username", &self.username)]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub school_id: Option<Uuid>,
    pub is_active: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            school_id: user.school_id,
            is_active: user.is_active,
        }
    }
}
