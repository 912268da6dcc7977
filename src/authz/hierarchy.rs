use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::action::Action;
use super::error::AuthzError;
use super::policy::PolicyResolver;

/// A node type in the resource tree (school, classroom, student, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKind(Cow<'static, str>);

impl ResourceKind {
    pub const SCHOOL: ResourceKind = ResourceKind(Cow::Borrowed("school"));
    pub const CLASSROOM: ResourceKind = ResourceKind(Cow::Borrowed("classroom"));
    pub const STUDENT: ResourceKind = ResourceKind(Cow::Borrowed("student"));

    pub fn new(name: impl Into<String>) -> Self {
        ResourceKind(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default policy of a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Reserved for an unauthenticated tier; never evaluated by `authorize`.
    pub anyone_can: Action,
    pub owner_can: Action,
}

impl Policy {
    pub const fn new(anyone_can: Action, owner_can: Action) -> Self {
        Self { anyone_can, owner_can }
    }
}

/// One entry of the static hierarchy declaration.
///
/// Exactly one of `policy` or `inherit: true` must be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDeclaration {
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    #[serde(default)]
    pub inherit: bool,
}

impl KindDeclaration {
    pub fn root(kind: ResourceKind, policy: Policy) -> Self {
        Self { kind, parent: None, policy: Some(policy), inherit: false }
    }

    pub fn child(kind: ResourceKind, parent: ResourceKind, policy: Policy) -> Self {
        Self { kind, parent: Some(parent), policy: Some(policy), inherit: false }
    }

    pub fn inheriting(kind: ResourceKind, parent: ResourceKind) -> Self {
        Self { kind, parent: Some(parent), policy: None, inherit: true }
    }
}

/// File format for a hierarchy declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyDeclaration {
    pub kinds: Vec<KindDeclaration>,
}

#[derive(Debug, Clone)]
enum PolicySource {
    Declared(Policy),
    Inherit,
}

#[derive(Debug, Clone)]
struct KindNode {
    parent: Option<ResourceKind>,
    source: PolicySource,
}

/// Immutable, validated tree of resource kinds.
#[derive(Debug, Clone)]
pub struct HierarchyRegistry {
    nodes: HashMap<ResourceKind, KindNode>,
    order: Vec<ResourceKind>,
}

impl HierarchyRegistry {
    /// Builds the registry, rejecting duplicate kinds, unknown parents,
    /// cycles, inheriting roots, and kinds whose policy cannot be resolved.
    pub fn new(declarations: impl IntoIterator<Item = KindDeclaration>) -> Result<Self, AuthzError> {
        let mut nodes = HashMap::new();
        let mut order = Vec::new();

        for decl in declarations {
            if nodes.contains_key(&decl.kind) {
                return Err(AuthzError::configuration(format!("resource kind '{}' is declared twice", decl.kind)));
            }
            let source = match (decl.policy, decl.inherit) {
                (Some(policy), false) => PolicySource::Declared(policy),
                (None, true) => PolicySource::Inherit,
                (Some(_), true) => {
                    return Err(AuthzError::configuration(format!(
                        "resource kind '{}' declares both a policy and inherit",
                        decl.kind
                    )))
                }
                (None, false) => {
                    return Err(AuthzError::configuration(format!(
                        "resource kind '{}' declares neither a policy nor inherit",
                        decl.kind
                    )))
                }
            };
            if decl.parent.is_none() && matches!(source, PolicySource::Inherit) {
                return Err(AuthzError::configuration(format!(
                    "root resource kind '{}' cannot inherit a policy",
                    decl.kind
                )));
            }
            order.push(decl.kind.clone());
            nodes.insert(decl.kind, KindNode { parent: decl.parent, source });
        }

        if nodes.is_empty() {
            return Err(AuthzError::configuration("hierarchy declares no resource kinds"));
        }

        for kind in &order {
            if let Some(parent) = &nodes[kind].parent {
                if !nodes.contains_key(parent) {
                    return Err(AuthzError::configuration(format!(
                        "resource kind '{}' names unregistered parent '{}'",
                        kind, parent
                    )));
                }
            }
        }

        for kind in &order {
            let mut seen = HashSet::new();
            let mut current = kind;
            while let Some(parent) = &nodes[current].parent {
                if !seen.insert(current) {
                    return Err(AuthzError::configuration(format!(
                        "resource hierarchy has a cycle through '{}'",
                        current
                    )));
                }
                current = parent;
            }
        }

        let registry = Self { nodes, order };
        let resolver = PolicyResolver::new(&registry);
        for kind in &registry.order {
            resolver.resolve(kind)?;
        }
        Ok(registry)
    }

    pub fn from_yaml(source: &str) -> Result<Self, AuthzError> {
        let declaration: HierarchyDeclaration = serde_yaml::from_str(source)
            .map_err(|e| AuthzError::configuration(format!("unreadable hierarchy declaration: {}", e)))?;
        Self::new(declaration.kinds)
    }

    pub fn contains(&self, kind: &ResourceKind) -> bool {
        self.nodes.contains_key(kind)
    }

    pub fn parent_of(&self, kind: &ResourceKind) -> Option<&ResourceKind> {
        self.nodes.get(kind).and_then(|n| n.parent.as_ref())
    }

    /// The kind's own policy; `None` for inheriting or unknown kinds.
    pub fn declared_policy(&self, kind: &ResourceKind) -> Option<Policy> {
        match self.nodes.get(kind).map(|n| &n.source) {
            Some(PolicySource::Declared(policy)) => Some(*policy),
            _ => None,
        }
    }

    pub fn is_root(&self, kind: &ResourceKind) -> bool {
        self.nodes.get(kind).map(|n| n.parent.is_none()).unwrap_or(false)
    }

    /// Kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = &ResourceKind> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
