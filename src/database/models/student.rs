use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{AsResource, ResourceInstance, ResourceKind, TenantId};
use crate::database::repository::{Document, UniqueKey};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub school_id: Uuid,
    pub classroom_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn new(school_id: TenantId, classroom_id: Option<Uuid>, name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            school_id: school_id.as_uuid(),
            classroom_id,
            name,
            email,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        TenantId(self.school_id)
    }
}

impl Document for Student {
    const TABLE: &'static str = "students";
    const TENANT_FIELD: &'static str = "school_id";

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

impl AsResource for Student {
    fn resource_kind() -> ResourceKind {
        ResourceKind::STUDENT
    }

    // Unassigned students hang directly off the school.
    fn to_instance(&self) -> ResourceInstance {
        let mut chain = vec![self.school_id];
        chain.extend(self.classroom_id);
        ResourceInstance::new(ResourceKind::STUDENT, self.id, self.tenant_id(), chain, self.is_active)
    }
}
