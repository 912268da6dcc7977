use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{Action, AsResource, AuthzEngine, Principal, ResourceKind};
use crate::database::models::School;
use crate::database::{Document, Store};
use crate::filter::FilterData;

use super::error::{ServiceError, ServiceResult};
use super::validate::{normalize_email, Validator};
use super::Page;

const DUPLICATE_EMAIL: &str = "school with this email already exists";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub struct SchoolService {
    engine: Arc<AuthzEngine>,
    store: Store,
}

impl SchoolService {
    pub fn new(engine: Arc<AuthzEngine>, store: Store) -> Self {
        Self { engine, store }
    }

    pub async fn create(&self, principal: &Principal, input: SchoolInput) -> ServiceResult<School> {
        self.engine.creation_target(principal, &ResourceKind::SCHOOL, None)?;

        Validator::new()
            .name(input.name.as_deref(), true)
            .address(input.address.as_deref(), true)
            .email(input.email.as_deref(), true)
            .phone(input.phone.as_deref(), false)
            .finish()?;

        let school = School::new(
            trimmed(input.name),
            trimmed(input.address),
            normalize_email(input.email.as_deref().unwrap_or_default()),
            input.phone.map(|p| p.trim().to_string()),
        );
        self.engine.require(principal, &school.to_instance(), Action::Create)?;

        self.ensure_unique_email(&school.email, None).await?;

        let school = self
            .store
            .schools
            .insert(school)
            .await
            .map_err(ServiceError::conflict_on_duplicate(DUPLICATE_EMAIL))?;
        tracing::info!("User {} created school {} ({})", principal.user_id(), school.id, school.name);
        Ok(school)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> ServiceResult<School> {
        let school = self.load(id).await?;
        self.engine.require(principal, &school.to_instance(), Action::Read)?;
        Ok(school)
    }

    pub async fn list(&self, principal: &Principal, page: Page) -> ServiceResult<Vec<School>> {
        let scope = self.engine.scope_filter(principal, None);
        let filter = page.filter::<School>(scope.constrain(School::TENANT_FIELD, None))?;
        Ok(self.store.schools.select_any(filter).await?)
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, input: SchoolInput) -> ServiceResult<School> {
        let mut school = self.load(id).await?;
        self.engine.require(principal, &school.to_instance(), Action::Update)?;
        self.engine.require_root_mutation(principal, &ResourceKind::SCHOOL, Action::Update)?;

        Validator::new()
            .name(input.name.as_deref(), false)
            .address(input.address.as_deref(), false)
            .email(input.email.as_deref(), false)
            .phone(input.phone.as_deref(), false)
            .finish()?;

        if let Some(email) = input.email.as_deref().map(normalize_email) {
            if email != school.email {
                self.ensure_unique_email(&email, Some(school.id)).await?;
                school.email = email;
            }
        }
        if let Some(name) = input.name {
            school.name = name.trim().to_string();
        }
        if let Some(address) = input.address {
            school.address = address.trim().to_string();
        }
        if let Some(phone) = input.phone {
            school.phone = Some(phone.trim().to_string());
        }
        school.updated_at = Utc::now();

        Ok(self
            .store
            .schools
            .update(school)
            .await
            .map_err(ServiceError::conflict_on_duplicate(DUPLICATE_EMAIL))?)
    }

    /// Soft delete; the school's classrooms and students stay as they are.
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> ServiceResult<()> {
        let mut school = self.load(id).await?;
        self.engine.require(principal, &school.to_instance(), Action::Delete)?;
        self.engine.require_root_mutation(principal, &ResourceKind::SCHOOL, Action::Delete)?;

        school.is_active = false;
        school.updated_at = Utc::now();
        self.store.schools.update(school).await?;
        tracing::info!("User {} deactivated school {}", principal.user_id(), id);
        Ok(())
    }

    async fn load(&self, id: Uuid) -> ServiceResult<School> {
        self.store
            .schools
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ResourceKind::SCHOOL))
    }

    async fn ensure_unique_email(&self, email: &str, except: Option<Uuid>) -> ServiceResult<()> {
        let mut filter = School::filter(FilterData::with_where(json!({ "email": email })))?;
        filter.include_inactive(true);
        let clash = self.store.schools.select_any(filter).await?.into_iter().any(|s| Some(s.id) != except);
        if clash {
            return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        Ok(())
    }
}

pub(crate) fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{AuthzError, DenyReason, TenantId};
    use crate::testing::{engine, school_input};

    fn service() -> SchoolService {
        SchoolService::new(engine(), Store::memory())
    }

    #[tokio::test]
    async fn only_global_admin_creates_schools() {
        let service = service();
        let root = Principal::global_admin(Uuid::new_v4());
        let school = service.create(&root, school_input("office@one.edu")).await.unwrap();
        assert_eq!(school.email, "office@one.edu");

        let admin = Principal::tenant_admin(Uuid::new_v4(), school.tenant_id());
        let err = service.create(&admin, school_input("office@two.edu")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(_))));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_even_after_delete() {
        let service = service();
        let root = Principal::global_admin(Uuid::new_v4());
        let school = service.create(&root, school_input("Office@One.edu")).await.unwrap();
        service.delete(&root, school.id).await.unwrap();

        let err = service.create(&root, school_input("office@one.edu")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn tenant_admin_reads_only_own_school() {
        let service = service();
        let root = Principal::global_admin(Uuid::new_v4());
        let one = service.create(&root, school_input("office@one.edu")).await.unwrap();
        let two = service.create(&root, school_input("office@two.edu")).await.unwrap();
        let admin = Principal::tenant_admin(Uuid::new_v4(), one.tenant_id());

        assert_eq!(service.get(&admin, one.id).await.unwrap().id, one.id);
        let err = service.get(&admin, two.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(DenyReason::CrossTenant))));

        let listed = service.list(&admin, Page::default()).await.unwrap();
        assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![one.id]);
        assert_eq!(service.list(&root, Page::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn deleted_school_is_not_found() {
        let service = service();
        let root = Principal::global_admin(Uuid::new_v4());
        let school = service.create(&root, school_input("office@one.edu")).await.unwrap();
        service.delete(&root, school.id).await.unwrap();

        assert!(matches!(service.get(&root, school.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(service.delete(&root, school.id).await, Err(ServiceError::NotFound(_))));
        assert!(service.list(&root, Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_validates_and_applies_changes() {
        let service = service();
        let root = Principal::global_admin(Uuid::new_v4());
        let school = service.create(&root, school_input("office@one.edu")).await.unwrap();
        service.create(&root, school_input("office@two.edu")).await.unwrap();

        let bad = SchoolInput { address: Some("x".into()), ..Default::default() };
        assert!(matches!(service.update(&root, school.id, bad).await, Err(ServiceError::Validation { .. })));

        let clash = SchoolInput { email: Some("office@two.edu".into()), ..Default::default() };
        assert!(matches!(service.update(&root, school.id, clash).await, Err(ServiceError::Conflict(_))));

        let rename = SchoolInput { name: Some("Renamed Academy".into()), ..Default::default() };
        let updated = service.update(&root, school.id, rename).await.unwrap();
        assert_eq!(updated.name, "Renamed Academy");
        assert_eq!(updated.email, "office@one.edu");
    }

    #[tokio::test]
    async fn tenant_admin_cannot_change_or_delete_own_school() {
        let service = service();
        let root = Principal::global_admin(Uuid::new_v4());
        let school = service.create(&root, school_input("office@one.edu")).await.unwrap();
        let admin = Principal::tenant_admin(Uuid::new_v4(), TenantId(school.id));

        let rename = SchoolInput { name: Some("Renamed Academy".into()), ..Default::default() };
        let err = service.update(&admin, school.id, rename).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(DenyReason::RootManagedGlobally))));

        let err = service.delete(&admin, school.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authz(AuthzError::Forbidden(DenyReason::RootManagedGlobally))));

        let kept = service.get(&admin, school.id).await.unwrap();
        assert!(kept.is_active);
        assert_eq!(kept.name, school.name);
    }
}
