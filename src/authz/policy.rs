use super::error::AuthzError;
use super::hierarchy::{HierarchyRegistry, Policy, ResourceKind};

/// Resolves the effective policy of a kind by walking up to the nearest
/// declared ancestor. Inheritance copies that policy verbatim.
pub struct PolicyResolver<'a> {
    registry: &'a HierarchyRegistry,
}

impl<'a> PolicyResolver<'a> {
    pub fn new(registry: &'a HierarchyRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, kind: &ResourceKind) -> Result<Policy, AuthzError> {
        if !self.registry.contains(kind) {
            return Err(AuthzError::configuration(format!("unknown resource kind '{}'", kind)));
        }

        // Bounded by the kind count; the registry holds no cycles.
        let mut current = kind;
        for _ in 0..=self.registry.len() {
            if let Some(policy) = self.registry.declared_policy(current) {
                return Ok(policy);
            }
            match self.registry.parent_of(current) {
                Some(parent) => current = parent,
                None => {
                    return Err(AuthzError::configuration(format!(
                        "no declared policy at or above '{}'",
                        kind
                    )))
                }
            }
        }
        Err(AuthzError::configuration(format!("policy walk from '{}' did not terminate", kind)))
    }
}
