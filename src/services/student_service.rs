use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{Action, AsResource, AuthzEngine, AuthzError, Principal, ResourceKind, TenantId};
use crate::database::models::Student;
use crate::database::{Document, Store};
use crate::filter::FilterData;

use super::error::{ServiceError, ServiceResult};
use super::school_service::trimmed;
use super::validate::{normalize_email, Validator};
use super::Page;

const DUPLICATE_EMAIL: &str = "student with this email already exists";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStudent {
    pub school_id: Option<Uuid>,
    pub classroom_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferStudent {
    pub classroom_id: Option<Uuid>,
}

pub struct StudentService {
    engine: Arc<AuthzEngine>,
    store: Store,
}

impl StudentService {
    pub fn new(engine: Arc<AuthzEngine>, store: Store) -> Self {
        Self { engine, store }
    }

    /// Enrolls a student. The school must be active, and so must the
    /// classroom when one is given, in the same school.
    pub async fn create(&self, principal: &Principal, input: CreateStudent) -> ServiceResult<Student> {
        let tenant = self
            .engine
            .creation_target(principal, &ResourceKind::STUDENT, input.school_id.map(TenantId))?
            .tenant()
            .ok_or_else(|| AuthzError::configuration("student must be nested under a school"))?;

        let student = Student::new(
            tenant,
            input.classroom_id,
            trimmed(input.name.clone()),
            normalize_email(input.email.as_deref().unwrap_or_default()),
        );
        self.engine.require(principal, &student.to_instance(), Action::Create)?;

        Validator::new()
            .name(input.name.as_deref(), true)
            .email(input.email.as_deref(), true)
            .finish()?;

        self.engine
            .check_parentage(tenant, tenant.as_uuid(), &self.store.school_lookup())
            .await?;
        if let Some(classroom_id) = student.classroom_id {
            self.engine
                .check_parentage(tenant, classroom_id, &self.store.classroom_lookup())
                .await?;
        }

        self.ensure_unique_email(&student.email, None).await?;

        let student = self
            .store
            .students
            .insert(student)
            .await
            .map_err(ServiceError::conflict_on_duplicate(DUPLICATE_EMAIL))?;
        tracing::info!("User {} enrolled student {} in school {}", principal.user_id(), student.id, tenant);
        Ok(student)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> ServiceResult<Student> {
        let student = self.load(id).await?;
        self.engine.require(principal, &student.to_instance(), Action::Read)?;
        Ok(student)
    }

    pub async fn list(
        &self,
        principal: &Principal,
        school_id: Option<Uuid>,
        classroom_id: Option<Uuid>,
        page: Page,
    ) -> ServiceResult<Vec<Student>> {
        let scope = self.engine.scope_filter(principal, school_id.map(TenantId));
        let narrowed = classroom_id.map(|id| json!({ "classroom_id": id.to_string() }));
        let filter = page.filter::<Student>(scope.constrain(Student::TENANT_FIELD, narrowed))?;
        Ok(self.store.students.select_any(filter).await?)
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, input: UpdateStudent) -> ServiceResult<Student> {
        let mut student = self.load(id).await?;
        self.engine.require(principal, &student.to_instance(), Action::Update)?;

        Validator::new()
            .name(input.name.as_deref(), false)
            .email(input.email.as_deref(), false)
            .finish()?;

        if let Some(email) = input.email.as_deref().map(normalize_email) {
            if email != student.email {
                self.ensure_unique_email(&email, Some(student.id)).await?;
                student.email = email;
            }
        }
        if let Some(name) = input.name {
            student.name = name.trim().to_string();
        }
        student.updated_at = Utc::now();

        Ok(self
            .store
            .students
            .update(student)
            .await
            .map_err(ServiceError::conflict_on_duplicate(DUPLICATE_EMAIL))?)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> ServiceResult<()> {
        let mut student = self.load(id).await?;
        self.engine.require(principal, &student.to_instance(), Action::Delete)?;

        student.is_active = false;
        student.updated_at = Utc::now();
        self.store.students.update(student).await?;
        tracing::info!("User {} withdrew student {}", principal.user_id(), id);
        Ok(())
    }

    /// Moves a student into another active classroom of the same school.
    pub async fn transfer(&self, principal: &Principal, id: Uuid, input: TransferStudent) -> ServiceResult<Student> {
        let mut student = self.load(id).await?;
        self.engine.require(principal, &student.to_instance(), Action::Update)?;

        let Some(classroom_id) = input.classroom_id else {
            return Err(ServiceError::Validation {
                message: "Validation failed".to_string(),
                field_errors: [("classroom_id".to_string(), "classroom_id is required".to_string())].into(),
            });
        };

        self.engine
            .check_parentage(student.tenant_id(), classroom_id, &self.store.classroom_lookup())
            .await?;

        let from = student.classroom_id.replace(classroom_id);
        student.updated_at = Utc::now();
        let student = self.store.students.update(student).await?;
        tracing::info!(
            "User {} transferred student {} from {:?} to classroom {}",
            principal.user_id(),
            id,
            from,
            classroom_id
        );
        Ok(student)
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Student> {
        self.store
            .students
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ResourceKind::STUDENT))
    }

    async fn ensure_unique_email(&self, email: &str, except: Option<Uuid>) -> ServiceResult<()> {
        let mut filter = Student::filter(FilterData::with_where(json!({ "email": email })))?;
        filter.include_inactive(true);
        let clash = self.store.students.select_any(filter).await?.into_iter().any(|s| Some(s.id) != except);
        if clash {
            return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        Ok(())
    }
}
