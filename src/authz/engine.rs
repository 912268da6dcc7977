use uuid::Uuid;

use super::action::Action;
use super::decision::{self, Decision, DenyReason};
use super::error::AuthzError;
use super::hierarchy::{HierarchyRegistry, KindDeclaration, Policy, ResourceKind};
use super::instance::ResourceInstance;
use super::integrity::{self, ParentLookup};
use super::policy::PolicyResolver;
use super::principal::{Principal, TenantId};
use super::scope::{self, ScopePredicate};

/// Where a resource being created will live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationTarget {
    /// A root resource that becomes its own tenant.
    NewTenant,
    /// A nested resource under an existing tenant.
    Within(TenantId),
}

impl CreationTarget {
    pub fn tenant(&self) -> Option<TenantId> {
        match self {
            CreationTarget::NewTenant => None,
            CreationTarget::Within(tenant) => Some(*tenant),
        }
    }
}

/// The authorization engine: the hierarchy plus every decision made over it.
///
/// Holds only immutable configuration and is shared across request tasks
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AuthzEngine {
    registry: HierarchyRegistry,
}

impl AuthzEngine {
    pub fn new(registry: HierarchyRegistry) -> Self {
        Self { registry }
    }

    pub fn from_declarations(declarations: impl IntoIterator<Item = KindDeclaration>) -> Result<Self, AuthzError> {
        HierarchyRegistry::new(declarations).map(Self::new)
    }

    pub fn registry(&self) -> &HierarchyRegistry {
        &self.registry
    }

    /// Fails unless every kind the caller relies on is registered.
    pub fn ensure_kinds(&self, kinds: &[ResourceKind]) -> Result<(), AuthzError> {
        match kinds.iter().find(|k| !self.registry.contains(k)) {
            Some(missing) => Err(AuthzError::configuration(format!(
                "resource kind '{}' is not declared in the hierarchy",
                missing
            ))),
            None => Ok(()),
        }
    }

    pub fn authorize(&self, principal: &Principal, instance: &ResourceInstance, action: Action) -> Decision {
        decision::authorize(&self.registry, principal, instance, action)
    }

    /// `authorize`, with a denial turned into `AuthzError::Forbidden`.
    pub fn require(&self, principal: &Principal, instance: &ResourceInstance, action: Action) -> Result<(), AuthzError> {
        self.authorize(principal, instance, action).into_result()
    }

    pub fn scope_filter(&self, principal: &Principal, explicit_tenant: Option<TenantId>) -> ScopePredicate {
        scope::scope_filter(principal, explicit_tenant)
    }

    pub async fn check_parentage<L>(&self, child_tenant: TenantId, parent_id: Uuid, lookup: &L) -> Result<(), AuthzError>
    where
        L: ParentLookup + ?Sized,
    {
        integrity::check_parentage(child_tenant, parent_id, lookup).await
    }

    pub fn resolve_effective_policy(&self, kind: &ResourceKind) -> Result<Policy, AuthzError> {
        PolicyResolver::new(&self.registry).resolve(kind)
    }

    /// Applies the creation-time tenant rules for a new resource of `kind`.
    ///
    /// - A root resource is its own tenant. Only a global administrator may
    ///   create one, and must not name a tenant for it.
    /// - A tenant administrator creates nested resources in their own tenant;
    ///   naming any other tenant is forbidden.
    /// - A global administrator must name the tenant of a nested resource.
    pub fn creation_target(
        &self,
        principal: &Principal,
        kind: &ResourceKind,
        requested: Option<TenantId>,
    ) -> Result<CreationTarget, AuthzError> {
        self.ensure_kinds(std::slice::from_ref(kind))?;

        if self.registry.is_root(kind) {
            if !principal.is_global_admin() {
                tracing::warn!("User {} may not create a new {}", principal.user_id(), kind);
                return Err(AuthzError::Forbidden(DenyReason::CrossTenant));
            }
            if requested.is_some() {
                return Err(AuthzError::InvalidTenantTarget(format!("a {} cannot belong to a school", kind)));
            }
            return Ok(CreationTarget::NewTenant);
        }

        if principal.is_global_admin() {
            return requested
                .map(CreationTarget::Within)
                .ok_or_else(|| AuthzError::InvalidTenantTarget("school_id is required".to_string()));
        }

        let own = principal.tenant_id().ok_or_else(|| AuthzError::MissingPrincipalTenant {
            role: principal.role().to_string(),
        })?;
        match requested {
            Some(other) if other != own => {
                tracing::warn!(
                    "User {} of school {} tried to create a {} in school {}",
                    principal.user_id(),
                    own,
                    kind,
                    other
                );
                Err(AuthzError::Forbidden(DenyReason::CrossTenant))
            }
            _ => Ok(CreationTarget::Within(own)),
        }
    }

    /// Companion to `creation_target` for existing root resources: only a
    /// global administrator may update or delete one, even within their own
    /// tenant. Other actions pass through untouched.
    pub fn require_root_mutation(
        &self,
        principal: &Principal,
        kind: &ResourceKind,
        action: Action,
    ) -> Result<(), AuthzError> {
        self.ensure_kinds(std::slice::from_ref(kind))?;

        let mutating = matches!(action, Action::Update | Action::Delete);
        if mutating && self.registry.is_root(kind) && !principal.is_global_admin() {
            tracing::warn!("User {} may not {} a {}", principal.user_id(), action, kind);
            return Err(AuthzError::Forbidden(DenyReason::RootManagedGlobally));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AuthzEngine {
        AuthzEngine::from_declarations(vec![
            KindDeclaration::root(ResourceKind::SCHOOL, Policy::new(Action::None, Action::Audit)),
            KindDeclaration::inheriting(ResourceKind::CLASSROOM, ResourceKind::SCHOOL),
            KindDeclaration::inheriting(ResourceKind::STUDENT, ResourceKind::CLASSROOM),
        ])
        .unwrap()
    }

    #[test]
    fn tenant_admin_cannot_create_in_another_tenant() {
        let engine = engine();
        let own = TenantId(Uuid::new_v4());
        let admin = Principal::tenant_admin(Uuid::new_v4(), own);
        let err = engine
            .creation_target(&admin, &ResourceKind::CLASSROOM, Some(TenantId(Uuid::new_v4())))
            .unwrap_err();
        assert!(matches!(err, AuthzError::Forbidden(DenyReason::CrossTenant)));
    }

    #[test]
    fn tenant_admin_defaults_to_own_tenant() {
        let engine = engine();
        let own = TenantId(Uuid::new_v4());
        let admin = Principal::tenant_admin(Uuid::new_v4(), own);
        for requested in [None, Some(own)] {
            let target = engine.creation_target(&admin, &ResourceKind::STUDENT, requested).unwrap();
            assert_eq!(target, CreationTarget::Within(own));
        }
    }

    #[test]
    fn tenant_admin_cannot_create_tenants() {
        let engine = engine();
        let admin = Principal::tenant_admin(Uuid::new_v4(), TenantId(Uuid::new_v4()));
        assert!(matches!(
            engine.creation_target(&admin, &ResourceKind::SCHOOL, None),
            Err(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn global_admin_names_tenant_only_for_nested_kinds() {
        let engine = engine();
        let admin = Principal::global_admin(Uuid::new_v4());
        let tenant = TenantId(Uuid::new_v4());

        assert_eq!(
            engine.creation_target(&admin, &ResourceKind::SCHOOL, None).unwrap(),
            CreationTarget::NewTenant
        );
        assert!(matches!(
            engine.creation_target(&admin, &ResourceKind::SCHOOL, Some(tenant)),
            Err(AuthzError::InvalidTenantTarget(_))
        ));
        assert_eq!(
            engine.creation_target(&admin, &ResourceKind::CLASSROOM, Some(tenant)).unwrap(),
            CreationTarget::Within(tenant)
        );
        assert!(matches!(
            engine.creation_target(&admin, &ResourceKind::CLASSROOM, None),
            Err(AuthzError::InvalidTenantTarget(_))
        ));
    }

    #[test]
    fn only_global_admin_mutates_roots() {
        let engine = engine();
        let own = TenantId(Uuid::new_v4());
        let admin = Principal::tenant_admin(Uuid::new_v4(), own);
        let root = Principal::global_admin(Uuid::new_v4());

        for action in [Action::Update, Action::Delete] {
            assert!(matches!(
                engine.require_root_mutation(&admin, &ResourceKind::SCHOOL, action),
                Err(AuthzError::Forbidden(DenyReason::RootManagedGlobally))
            ));
            assert!(engine.require_root_mutation(&root, &ResourceKind::SCHOOL, action).is_ok());
            assert!(engine.require_root_mutation(&admin, &ResourceKind::CLASSROOM, action).is_ok());
        }
        assert!(engine.require_root_mutation(&admin, &ResourceKind::SCHOOL, Action::Read).is_ok());
    }

    #[test]
    fn unknown_kinds_are_configuration_errors() {
        let engine = engine();
        let admin = Principal::global_admin(Uuid::new_v4());
        assert!(matches!(
            engine.creation_target(&admin, &ResourceKind::new("teacher"), None),
            Err(AuthzError::Configuration(_))
        ));
        assert!(engine.ensure_kinds(&[ResourceKind::SCHOOL, ResourceKind::STUDENT]).is_ok());
        assert!(engine.ensure_kinds(&[ResourceKind::new("teacher")]).is_err());
    }

    #[test]
    fn inherited_policies_match_their_parent() {
        let engine = engine();
        let registry = engine.registry();
        for kind in registry.kinds() {
            if registry.declared_policy(kind).is_none() {
                let parent = registry.parent_of(kind).unwrap();
                assert_eq!(
                    engine.resolve_effective_policy(kind).unwrap(),
                    engine.resolve_effective_policy(parent).unwrap()
                );
            }
        }
    }
}
