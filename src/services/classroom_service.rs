use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{Action, AsResource, AuthzEngine, AuthzError, Principal, ResourceInstance, ResourceKind, TenantId};
use crate::database::models::Classroom;
use crate::database::{Document, Store};
use crate::filter::FilterData;

use super::error::{ServiceError, ServiceResult};
use super::school_service::trimmed;
use super::validate::{checked_capacity, Validator};
use super::Page;

const DUPLICATE_NAME: &str = "classroom with this name already exists in this school";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateClassroom {
    pub school_id: Option<Uuid>,
    pub name: Option<String>,
    pub capacity: Option<i64>,
    pub resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClassroom {
    pub name: Option<String>,
    pub capacity: Option<i64>,
    pub resources: Option<Vec<String>>,
}

pub struct ClassroomService {
    engine: Arc<AuthzEngine>,
    store: Store,
}

impl ClassroomService {
    pub fn new(engine: Arc<AuthzEngine>, store: Store) -> Self {
        Self { engine, store }
    }

    pub async fn create(&self, principal: &Principal, input: CreateClassroom) -> ServiceResult<Classroom> {
        let tenant = self
            .engine
            .creation_target(principal, &ResourceKind::CLASSROOM, input.school_id.map(TenantId))?
            .tenant()
            .ok_or_else(|| AuthzError::configuration("classroom must be nested under a school"))?;

        let prospective = ResourceInstance::prospective(ResourceKind::CLASSROOM, tenant, vec![tenant.as_uuid()]);
        self.engine.require(principal, &prospective, Action::Create)?;

        Validator::new()
            .name(input.name.as_deref(), true)
            .capacity(input.capacity, true)
            .resources(input.resources.as_deref())
            .finish()?;

        let classroom = Classroom::new(
            tenant,
            trimmed(input.name),
            checked_capacity(input.capacity.unwrap_or_default())?,
            input.resources.unwrap_or_default(),
        );

        self.engine
            .check_parentage(tenant, tenant.as_uuid(), &self.store.school_lookup())
            .await?;

        self.ensure_unique_name(tenant, &classroom.name, None).await?;

        let classroom = self
            .store
            .classrooms
            .insert(classroom)
            .await
            .map_err(ServiceError::conflict_on_duplicate(DUPLICATE_NAME))?;
        tracing::info!("User {} created classroom {} in school {}", principal.user_id(), classroom.id, tenant);
        Ok(classroom)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> ServiceResult<Classroom> {
        let classroom = self.load(id).await?;
        self.engine.require(principal, &classroom.to_instance(), Action::Read)?;
        Ok(classroom)
    }

    /// Lists active classrooms visible to `principal`. `school_id` narrows a
    /// global administrator's view; a tenant administrator always sees their own.
    pub async fn list(&self, principal: &Principal, school_id: Option<Uuid>, page: Page) -> ServiceResult<Vec<Classroom>> {
        let scope = self.engine.scope_filter(principal, school_id.map(TenantId));
        let filter = page.filter::<Classroom>(scope.constrain(Classroom::TENANT_FIELD, None))?;
        Ok(self.store.classrooms.select_any(filter).await?)
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, input: UpdateClassroom) -> ServiceResult<Classroom> {
        let mut classroom = self.load(id).await?;
        self.engine.require(principal, &classroom.to_instance(), Action::Update)?;

        Validator::new()
            .name(input.name.as_deref(), false)
            .capacity(input.capacity, false)
            .resources(input.resources.as_deref())
            .finish()?;

        if let Some(name) = input.name.map(|n| n.trim().to_string()) {
            if name != classroom.name {
                self.ensure_unique_name(classroom.tenant_id(), &name, Some(classroom.id)).await?;
                classroom.name = name;
            }
        }
        if let Some(capacity) = input.capacity {
            classroom.capacity = checked_capacity(capacity)?;
        }
        if let Some(resources) = input.resources {
            classroom.resources = resources;
        }
        classroom.updated_at = Utc::now();

        Ok(self
            .store
            .classrooms
            .update(classroom)
            .await
            .map_err(ServiceError::conflict_on_duplicate(DUPLICATE_NAME))?)
    }

    /// Soft delete. Students keep their `classroom_id`; transfers into this
    /// classroom fail from now on.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> ServiceResult<()> {
        let mut classroom = self.load(id).await?;
        self.engine.require(principal, &classroom.to_instance(), Action::Delete)?;

        classroom.is_active = false;
        classroom.updated_at = Utc::now();
        self.store.classrooms.update(classroom).await?;
        tracing::info!("User {} deactivated classroom {}", principal.user_id(), id);
        Ok(())
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Classroom> {
        self.store
            .classrooms
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ResourceKind::CLASSROOM))
    }

    async fn ensure_unique_name(&self, tenant: TenantId, name: &str, except: Option<Uuid>) -> ServiceResult<()> {
        let conditions = json!({ "school_id": tenant.to_string(), "name": name });
        let filter = Classroom::filter(FilterData::with_where(conditions))?;
        let clash = self
            .store
            .classrooms
            .select_any(filter)
            .await?
            .into_iter()
            .any(|c| Some(c.id) != except);
        if clash {
            return Err(ServiceError::Conflict(DUPLICATE_NAME.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::DenyReason;
    use crate::testing::{classroom_input, engine, seed_school};

    #[tokio::test]
    async fn tenant_admin_creates_in_own_school_by_default() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let school = seed_school(&store, "office@one.edu").await;
        let admin = Principal::tenant_admin(Uuid::new_v4(), school.tenant_id());

        let classroom = service.create(&admin, classroom_input(None, "Room 101")).await.unwrap();
        assert_eq!(classroom.school_id, school.id);
        assert_eq!(classroom.capacity, 30);
    }

    #[tokio::test]
    async fn tenant_admin_cannot_create_in_another_school() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let one = seed_school(&store, "office@one.edu").await;
        let two = seed_school(&store, "office@two.edu").await;
        let admin = Principal::tenant_admin(Uuid::new_v4(), one.tenant_id());

        let err = service.create(&admin, classroom_input(Some(two.id), "Room 101")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(DenyReason::CrossTenant))));
        let root = Principal::global_admin(Uuid::new_v4());
        assert!(service.list(&root, None, Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn global_admin_must_name_an_active_school() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let root = Principal::global_admin(Uuid::new_v4());

        let err = service.create(&root, classroom_input(None, "Room 101")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::InvalidTenantTarget(_))));

        let err = service.create(&root, classroom_input(Some(Uuid::new_v4()), "Room 101")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::ParentNotFound { .. })));
    }

    #[tokio::test]
    async fn capacity_is_required() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let school = seed_school(&store, "office@one.edu").await;
        let root = Principal::global_admin(Uuid::new_v4());

        let input = CreateClassroom { capacity: None, ..classroom_input(Some(school.id), "Room 101") };
        match service.create(&root, input).await {
            Err(ServiceError::Validation { field_errors, .. }) => assert!(field_errors.contains_key("capacity")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn capacity_beyond_storage_width_is_rejected() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let school = seed_school(&store, "office@one.edu").await;
        let root = Principal::global_admin(Uuid::new_v4());

        let input = CreateClassroom { capacity: Some(i64::from(i32::MAX) + 1), ..classroom_input(Some(school.id), "Room 101") };
        match service.create(&root, input).await {
            Err(ServiceError::Validation { field_errors, .. }) => assert!(field_errors.contains_key("capacity")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(service.list(&root, Some(school.id), Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_are_unique_among_active_classrooms_of_a_school() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let one = seed_school(&store, "office@one.edu").await;
        let two = seed_school(&store, "office@two.edu").await;
        let root = Principal::global_admin(Uuid::new_v4());

        let first = service.create(&root, classroom_input(Some(one.id), "Room 101")).await.unwrap();
        let err = service.create(&root, classroom_input(Some(one.id), "Room 101")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(m) if m == DUPLICATE_NAME));

        service.create(&root, classroom_input(Some(two.id), "Room 101")).await.unwrap();

        service.delete(&root, first.id).await.unwrap();
        service.create(&root, classroom_input(Some(one.id), "Room 101")).await.unwrap();
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_callers_school() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let one = seed_school(&store, "office@one.edu").await;
        let two = seed_school(&store, "office@two.edu").await;
        let root = Principal::global_admin(Uuid::new_v4());
        service.create(&root, classroom_input(Some(one.id), "Room 101")).await.unwrap();
        service.create(&root, classroom_input(Some(two.id), "Room 201")).await.unwrap();

        let admin = Principal::tenant_admin(Uuid::new_v4(), one.tenant_id());
        let listed = service.list(&admin, Some(two.id), Page::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].school_id, one.id);

        assert_eq!(service.list(&root, None, Page::default()).await.unwrap().len(), 2);
        assert_eq!(service.list(&root, Some(two.id), Page::default()).await.unwrap()[0].name, "Room 201");
    }

    #[tokio::test]
    async fn update_and_delete_respect_tenancy() {
        let store = Store::memory();
        let service = ClassroomService::new(engine(), store.clone());
        let one = seed_school(&store, "office@one.edu").await;
        let two = seed_school(&store, "office@two.edu").await;
        let root = Principal::global_admin(Uuid::new_v4());
        let classroom = service.create(&root, classroom_input(Some(two.id), "Room 201")).await.unwrap();

        let outsider = Principal::tenant_admin(Uuid::new_v4(), one.tenant_id());
        let change = UpdateClassroom { capacity: Some(12), ..Default::default() };
        assert!(matches!(
            service.update(&outsider, classroom.id, change.clone()).await,
            Err(ServiceError::Authz(AuthzError::Forbidden(_)))
        ));
        assert!(matches!(service.delete(&outsider, classroom.id).await, Err(ServiceError::Authz(_))));

        let owner = Principal::tenant_admin(Uuid::new_v4(), two.tenant_id());
        assert_eq!(service.update(&owner, classroom.id, change).await.unwrap().capacity, 12);
        service.delete(&owner, classroom.id).await.unwrap();
        assert!(matches!(service.get(&owner, classroom.id).await, Err(ServiceError::NotFound(_))));
    }
}
