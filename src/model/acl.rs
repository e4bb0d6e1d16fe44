//! model::acl
//!
//! Access control lists.
//!
//! An [`Acl`] maps a principal id to its [`Ace`]. Edits through
//! [`Acl::add_entry`] and [`Acl::remove_entry`] touch only the in-memory
//! list; nothing reaches the server until the list is applied with
//! `CmisObject::apply_acl`.
//!
//! # Example
//!
//! ```
//! use cmisclient::model::Acl;
//!
//! let mut acl = Acl::new();
//! acl.add_entry("jdoe", ["cmis:read"], true);
//! acl.add_entry("jdoe", ["cmis:write"], true);
//! assert_eq!(acl.get("jdoe").unwrap().permissions, vec!["cmis:read", "cmis:write"]);
//!
//! acl.remove_entry("jdoe");
//! assert!(acl.is_empty());
//! ```

use std::collections::BTreeMap;

/// An access control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    pub principal_id: String,
    pub permissions: Vec<String>,
    /// `true` when granted on the object itself, `false` when inherited.
    pub direct: bool,
}

impl Ace {
    pub fn new<I, S>(principal_id: impl Into<String>, permissions: I, direct: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principal_id: principal_id.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
            direct,
        }
    }
}

/// An access control list keyed by principal id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    entries: BTreeMap<String, Ace>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of entries; entries for the same principal merge.
    pub fn from_entries(entries: impl IntoIterator<Item = Ace>) -> Self {
        let mut acl = Acl::new();
        for ace in entries {
            acl.add_entry(ace.principal_id, ace.permissions, ace.direct);
        }
        acl
    }

    /// Grant permissions to a principal.
    ///
    /// An existing entry for the principal keeps its permissions and gains
    /// the new ones; it becomes direct if either side is direct.
    pub fn add_entry<I, S>(&mut self, principal_id: impl Into<String>, permissions: I, direct: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let principal_id = principal_id.into();
        let ace = self
            .entries
            .entry(principal_id.clone())
            .or_insert_with(|| Ace {
                principal_id,
                permissions: Vec::new(),
                direct,
            });
        ace.direct |= direct;
        for permission in permissions {
            let permission = permission.into();
            if !ace.permissions.contains(&permission) {
                ace.permissions.push(permission);
            }
        }
    }

    /// Drop the entry for a principal, returning it.
    pub fn remove_entry(&mut self, principal_id: &str) -> Option<Ace> {
        self.entries.remove(principal_id)
    }

    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, principal_id: &str) -> Option<&Ace> {
        self.entries.get(principal_id)
    }

    pub fn entries(&self) -> &BTreeMap<String, Ace> {
        &self.entries
    }

    /// Entries granted on the object itself; only these are sent on apply.
    pub fn direct_entries(&self) -> impl Iterator<Item = &Ace> {
        self.entries.values().filter(|ace| ace.direct)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_merges_without_duplicates() {
        let mut acl = Acl::new();
        acl.add_entry("alice", ["cmis:read"], false);
        acl.add_entry("alice", ["cmis:read", "cmis:write"], true);

        let ace = acl.get("alice").unwrap();
        assert_eq!(ace.permissions, vec!["cmis:read", "cmis:write"]);
        assert!(ace.direct);
        assert_eq!(acl.len(), 1);
    }

    #[test]
    fn direct_entries_filter_inherited() {
        let acl = Acl::from_entries(vec![
            Ace::new("alice", ["cmis:all"], true),
            Ace::new("GROUP_EVERYONE", ["cmis:read"], false),
        ]);
        let direct: Vec<_> = acl.direct_entries().map(|a| a.principal_id.as_str()).collect();
        assert_eq!(direct, vec!["alice"]);
    }

    #[test]
    fn remove_and_clear() {
        let mut acl = Acl::from_entries(vec![
            Ace::new("a", ["cmis:read"], true),
            Ace::new("b", ["cmis:read"], true),
        ]);
        assert!(acl.remove_entry("a").is_some());
        assert!(acl.remove_entry("a").is_none());
        assert_eq!(acl.len(), 1);
        acl.clear_entries();
        assert!(acl.is_empty());
    }
}
