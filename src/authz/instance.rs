use uuid::Uuid;

use super::hierarchy::ResourceKind;
use super::principal::TenantId;

/// A concrete resource being acted on.
///
/// `tenant_id` is always the root school, however deep the resource sits.
/// `owner_chain` lists ancestor ids from the root down to the direct parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInstance {
    pub kind: ResourceKind,
    pub id: Option<Uuid>,
    pub tenant_id: TenantId,
    pub owner_chain: Vec<Uuid>,
    pub active: bool,
}

impl ResourceInstance {
    pub fn new(kind: ResourceKind, id: Uuid, tenant_id: TenantId, owner_chain: Vec<Uuid>, active: bool) -> Self {
        Self { kind, id: Some(id), tenant_id, owner_chain, active }
    }

    /// A resource that is about to be created and has no id yet.
    pub fn prospective(kind: ResourceKind, tenant_id: TenantId, owner_chain: Vec<Uuid>) -> Self {
        Self { kind, id: None, tenant_id, owner_chain, active: true }
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        self.owner_chain.last().copied()
    }
}

/// Anything that can be presented to the engine as a resource instance.
pub trait AsResource {
    fn resource_kind() -> ResourceKind;
    fn to_instance(&self) -> ResourceInstance;
}
