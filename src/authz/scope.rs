use serde::Serialize;
use serde_json::{json, Value};

use super::principal::{Principal, TenantId};

/// Restriction on which tenant's resources a collection query may return.
/// `tenant_id: None` matches every tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScopePredicate {
    pub tenant_id: Option<TenantId>,
}

impl ScopePredicate {
    pub fn everything() -> Self {
        Self { tenant_id: None }
    }

    pub fn tenant(tenant_id: TenantId) -> Self {
        Self { tenant_id: Some(tenant_id) }
    }

    pub fn matches(&self, tenant_id: TenantId) -> bool {
        self.tenant_id.map(|t| t == tenant_id).unwrap_or(true)
    }

    /// Folds the predicate into a filter-language WHERE clause on
    /// `tenant_field`. The caller's conditions are AND-ed, never replaced, so
    /// they cannot widen the scope.
    pub fn constrain(&self, tenant_field: &str, conditions: Option<Value>) -> Option<Value> {
        let Some(tenant) = self.tenant_id else {
            return conditions;
        };
        let scoped = json!({ tenant_field: tenant.to_string() });
        match conditions {
            None => Some(scoped),
            Some(Value::Object(map)) if map.is_empty() => Some(scoped),
            Some(existing) => Some(json!({ "$and": [scoped, existing] })),
        }
    }
}

/// Derives the collection scope for `principal`.
///
/// A global administrator sees everything unless they name a tenant. A tenant
/// administrator is pinned to their own tenant whatever they ask for.
pub fn scope_filter(principal: &Principal, explicit_tenant: Option<TenantId>) -> ScopePredicate {
    if principal.is_global_admin() {
        return ScopePredicate { tenant_id: explicit_tenant };
    }

    if let (Some(requested), Some(own)) = (explicit_tenant, principal.tenant_id()) {
        if requested != own {
            tracing::debug!(
                "Ignoring requested school {} for user {}; scoped to {}",
                requested,
                principal.user_id(),
                own
            );
        }
    }
    ScopePredicate { tenant_id: principal.tenant_id() }
}
