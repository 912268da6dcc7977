//! Hierarchical multi-tenant authorization.
//!
//! Resource kinds form a forest rooted at tenant kinds (schools). Each kind
//! declares or inherits a policy, and every decision reduces to comparing the
//! requested action against the effective `owner_can` level once tenancy has
//! been established.

pub mod action;
pub mod decision;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod instance;
pub mod integrity;
pub mod policy;
pub mod principal;
pub mod scope;

pub use action::Action;
pub use decision::{authorize, Decision, DenyReason};
pub use engine::{AuthzEngine, CreationTarget};
pub use error::AuthzError;
pub use hierarchy::{HierarchyDeclaration, HierarchyRegistry, KindDeclaration, Policy, ResourceKind};
pub use instance::{AsResource, ResourceInstance};
pub use integrity::{check_parentage, verify_parent, ParentLookup};
pub use policy::PolicyResolver;
pub use principal::{Principal, Role, TenantId};
pub use scope::{scope_filter, ScopePredicate};
