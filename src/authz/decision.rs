use serde::Serialize;
use std::fmt;

use super::action::Action;
use super::error::AuthzError;
use super::hierarchy::HierarchyRegistry;
use super::instance::ResourceInstance;
use super::policy::PolicyResolver;
use super::principal::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    CrossTenant,
    ExceedsOwnerPrivilege,
    /// Root resources are created, changed and removed by global administrators only.
    RootManagedGlobally,
    /// The instance's kind has no resolvable policy.
    UnresolvedPolicy,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::CrossTenant => "cross-tenant access denied",
            DenyReason::ExceedsOwnerPrivilege => "action exceeds owner privilege",
            DenyReason::RootManagedGlobally => "only a global administrator may modify this resource",
            DenyReason::UnresolvedPolicy => "no policy governs this resource",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub permit: bool,
    pub reason: Option<DenyReason>,
}

impl Decision {
    pub fn permit() -> Self {
        Self { permit: true, reason: None }
    }

    pub fn deny(reason: DenyReason) -> Self {
        Self { permit: false, reason: Some(reason) }
    }

    pub fn into_result(self) -> Result<(), AuthzError> {
        match (self.permit, self.reason) {
            (true, _) => Ok(()),
            (false, Some(reason)) => Err(AuthzError::Forbidden(reason)),
            (false, None) => Err(AuthzError::Forbidden(DenyReason::UnresolvedPolicy)),
        }
    }
}

/// Decides whether `principal` may perform `action` on `instance`.
///
/// Global administrators are always permitted. Anyone else must own the
/// instance's tenant and be granted the action by the kind's effective
/// `owner_can` level.
pub fn authorize(
    registry: &HierarchyRegistry,
    principal: &Principal,
    instance: &ResourceInstance,
    action: Action,
) -> Decision {
    if principal.is_global_admin() {
        return Decision::permit();
    }

    if principal.tenant_id() != Some(instance.tenant_id) {
        tracing::warn!(
            "Denied {} on {} in school {} for user {}: cross-tenant",
            action,
            instance.kind,
            instance.tenant_id,
            principal.user_id()
        );
        return Decision::deny(DenyReason::CrossTenant);
    }

    let policy = match PolicyResolver::new(registry).resolve(&instance.kind) {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!("Denied {} on {}: {}", action, instance.kind, e);
            return Decision::deny(DenyReason::UnresolvedPolicy);
        }
    };

    if Action::at_least(action, policy.owner_can) {
        tracing::debug!("Permitted {} on {} for user {}", action, instance.kind, principal.user_id());
        Decision::permit()
    } else {
        tracing::warn!(
            "Denied {} on {} for user {}: owner may only {}",
            action,
            instance.kind,
            principal.user_id(),
            policy.owner_can
        );
        Decision::deny(DenyReason::ExceedsOwnerPrivilege)
    }
}
