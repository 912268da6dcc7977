use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{AsResource, ResourceInstance, ResourceKind, TenantId};
use crate::database::repository::{Document, UniqueKey};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub resources: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Classroom {
    pub fn new(school_id: TenantId, name: String, capacity: i32, resources: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            school_id: school_id.as_uuid(),
            name,
            capacity,
            resources,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        TenantId(self.school_id)
    }
}

impl Document for Classroom {
    const TABLE: &'static str = "classrooms";
    const TENANT_FIELD: &'static str = "school_id";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    // Names only clash among active classrooms of the same school.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::active("name", &[("school_id", self.school_id.to_string()), ("name", self.name.clone())])]
    }
}

impl AsResource for Classroom {
    fn resource_kind() -> ResourceKind {
        ResourceKind::CLASSROOM
    }

    fn to_instance(&self) -> ResourceInstance {
        ResourceInstance::new(
            ResourceKind::CLASSROOM,
            self.id,
            self.tenant_id(),
            vec![self.school_id],
            self.is_active,
        )
    }
}
