use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{AsResource, ResourceInstance, ResourceKind, TenantId};
use crate::database::repository::{Document, UniqueKey};

/// A school is the tenant root: its own id is its tenant id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: Option<String>,
    pub admin_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl School {
    pub fn new(name: String, address: String, email: String, phone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            address,
            email,
            phone,
            admin_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        TenantId(self.id)
    }
}

impl Document for School {
    const TABLE: &'static str = "schools";
    const TENANT_FIELD: &'static str = "id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::global("email", &self.email)]
    }
}

impl AsResource for School {
    fn resource_kind() -> ResourceKind {
        ResourceKind::SCHOOL
    }

    fn to_instance(&self) -> ResourceInstance {
        ResourceInstance::new(ResourceKind::SCHOOL, self.id, self.tenant_id(), vec![], self.is_active)
    }
}
