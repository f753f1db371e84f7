//! User identity types.
//!
//! Authentication lives outside this crate: the HTTP layer hands us an
//! already-verified user id. The roster maps those ids to display names
//! for aggregate breakdowns and notifications.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque user identifier supplied by the authenticating front end.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

/// Known users and their display names, loaded from server configuration.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    names: BTreeMap<UserId, String>,
}

impl Roster {
    pub fn new(names: BTreeMap<UserId, String>) -> Self {
        Roster { names }
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.names.contains_key(id)
    }

    /// Display name for a user, falling back to the raw id when unknown.
    pub fn display_name(&self, id: &UserId) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

impl FromIterator<(String, String)> for Roster {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Roster {
            names: iter
                .into_iter()
                .map(|(id, name)| (UserId::new(id), name))
                .collect(),
        }
    }
}
