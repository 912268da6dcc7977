use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::AuthzError;

/// Identity of a school, the top-level isolation boundary. Compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        TenantId(id)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TenantId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "superadmin")]
    GlobalAdmin,
    #[serde(rename = "school_admin")]
    TenantAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::GlobalAdmin => "superadmin",
            Role::TenantAdmin => "school_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::GlobalAdmin),
            "school_admin" => Ok(Role::TenantAdmin),
            other => Err(AuthzError::UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The verified caller of a request.
///
/// A tenant administrator always carries a tenant. A global administrator's
/// tenant is dropped at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    role: Role,
    tenant_id: Option<TenantId>,
    user_id: Uuid,
}

impl Principal {
    pub fn new(role: Role, tenant_id: Option<TenantId>, user_id: Uuid) -> Result<Self, AuthzError> {
        match role {
            Role::GlobalAdmin => Ok(Self::global_admin(user_id)),
            Role::TenantAdmin => tenant_id
                .map(|tenant| Self::tenant_admin(user_id, tenant))
                .ok_or_else(|| AuthzError::MissingPrincipalTenant { role: role.to_string() }),
        }
    }

    pub fn global_admin(user_id: Uuid) -> Self {
        Self { role: Role::GlobalAdmin, tenant_id: None, user_id }
    }

    pub fn tenant_admin(user_id: Uuid, tenant_id: TenantId) -> Self {
        Self { role: Role::TenantAdmin, tenant_id: Some(tenant_id), user_id }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_global_admin(&self) -> bool {
        self.role == Role::GlobalAdmin
    }
}
