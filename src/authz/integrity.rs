use async_trait::async_trait;
use uuid::Uuid;

use super::error::AuthzError;
use super::hierarchy::ResourceKind;
use super::instance::ResourceInstance;
use super::principal::TenantId;

/// Storage-backed lookup of a prospective parent. Implementations only ever
/// return active instances.
#[async_trait]
pub trait ParentLookup: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn find_active(&self, id: Uuid) -> anyhow::Result<Option<ResourceInstance>>;
}

/// Validates an already-fetched parent against the child's tenant.
pub fn verify_parent(
    kind: &ResourceKind,
    child_tenant: TenantId,
    parent: Option<&ResourceInstance>,
) -> Result<(), AuthzError> {
    let parent = match parent {
        Some(parent) if parent.active => parent,
        _ => return Err(AuthzError::ParentNotFound { kind: kind.clone() }),
    };
    if parent.tenant_id != child_tenant {
        return Err(AuthzError::TenantMismatch { kind: kind.clone() });
    }
    Ok(())
}

/// Fetches `parent_id` and checks that it exists, is active, and lives in
/// `child_tenant`. Run after authorization and before the write.
pub async fn check_parentage<L>(child_tenant: TenantId, parent_id: Uuid, lookup: &L) -> Result<(), AuthzError>
where
    L: ParentLookup + ?Sized,
{
    let kind = lookup.kind();
    let parent = lookup.find_active(parent_id).await.map_err(AuthzError::Lookup)?;
    let result = verify_parent(&kind, child_tenant, parent.as_ref());
    if let Err(e) = &result {
        tracing::warn!("Parentage check failed for {} {} under school {}: {}", kind, parent_id, child_tenant, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed(HashMap<Uuid, ResourceInstance>);

    #[async_trait]
    impl ParentLookup for Fixed {
        fn kind(&self) -> ResourceKind {
            ResourceKind::CLASSROOM
        }

        async fn find_active(&self, id: Uuid) -> anyhow::Result<Option<ResourceInstance>> {
            Ok(self.0.get(&id).filter(|i| i.active).cloned())
        }
    }

    struct Broken;

    #[async_trait]
    impl ParentLookup for Broken {
        fn kind(&self) -> ResourceKind {
            ResourceKind::SCHOOL
        }

        async fn find_active(&self, _id: Uuid) -> anyhow::Result<Option<ResourceInstance>> {
            anyhow::bail!("connection reset")
        }
    }

    fn classroom(tenant: TenantId, active: bool) -> ResourceInstance {
        ResourceInstance::new(ResourceKind::CLASSROOM, Uuid::new_v4(), tenant, vec![tenant.as_uuid()], active)
    }

    #[tokio::test]
    async fn accepts_active_parent_in_same_tenant() {
        let tenant = TenantId(Uuid::new_v4());
        let parent = classroom(tenant, true);
        let id = parent.id.unwrap();
        let lookup = Fixed(HashMap::from([(id, parent)]));
        assert!(check_parentage(tenant, id, &lookup).await.is_ok());
    }

    #[tokio::test]
    async fn missing_or_inactive_parent_is_not_found() {
        let tenant = TenantId(Uuid::new_v4());
        let inactive = classroom(tenant, false);
        let id = inactive.id.unwrap();
        let lookup = Fixed(HashMap::from([(id, inactive)]));

        let err = check_parentage(tenant, id, &lookup).await.unwrap_err();
        assert!(matches!(err, AuthzError::ParentNotFound { .. }));
        let err = check_parentage(tenant, Uuid::new_v4(), &lookup).await.unwrap_err();
        assert!(matches!(err, AuthzError::ParentNotFound { .. }));
    }

    #[tokio::test]
    async fn parent_in_other_tenant_is_a_mismatch() {
        let parent = classroom(TenantId(Uuid::new_v4()), true);
        let id = parent.id.unwrap();
        let lookup = Fixed(HashMap::from([(id, parent)]));
        let err = check_parentage(TenantId(Uuid::new_v4()), id, &lookup).await.unwrap_err();
        assert!(matches!(err, AuthzError::TenantMismatch { .. }));
        assert!(err.is_unresolved_reference());
    }

    #[test]
    fn verify_parent_rejects_inactive_even_if_handed_in() {
        let tenant = TenantId(Uuid::new_v4());
        let parent = classroom(tenant, false);
        assert!(matches!(
            verify_parent(&ResourceKind::CLASSROOM, tenant, Some(&parent)),
            Err(AuthzError::ParentNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn lookup_failures_are_surfaced() {
        let err = check_parentage(TenantId(Uuid::new_v4()), Uuid::new_v4(), &Broken).await.unwrap_err();
        assert!(matches!(err, AuthzError::Lookup(_)));
    }
}
