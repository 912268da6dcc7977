use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::AuthzError;

/// Privilege levels, totally ordered by severity.
///
/// A requested action is permitted at a granted level when its severity does
/// not exceed the granted level's severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Blocked,
    None,
    Read,
    Create,
    Update,
    Delete,
    Audit,
}

impl Action {
    /// Every action in ascending severity order.
    pub const ALL: [Action; 7] = [
        Action::Blocked,
        Action::None,
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Audit,
    ];

    pub fn severity(self) -> i8 {
        match self {
            Action::Blocked => -1,
            Action::None => 1,
            Action::Read => 2,
            Action::Create => 3,
            Action::Update => 4,
            Action::Delete => 5,
            Action::Audit => 6,
        }
    }

    /// True iff `requested` is covered by `granted`.
    pub fn at_least(requested: Action, granted: Action) -> bool {
        requested.severity() <= granted.severity()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Blocked => "blocked",
            Action::None => "none",
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Audit => "audit",
        }
    }
}

impl PartialOrd for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AuthzError::UnknownAction(s.to_string()))
    }
}
