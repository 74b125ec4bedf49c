//! Permission tokens and permission sets.
//!
//! A tool may only be shown to, or invoked by, an agent that holds every
//! permission the tool requires. Permissions are granted in static agent
//! configuration and never change while the process runs.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque permission token.
///
/// Tokens are namespaced strings such as "read:tasks" or "write:workflows".
/// They are compared for equality only; there is no hierarchy, so
/// "write:tasks" does not imply "read:tasks".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission(pub String);

impl Permission {
    /// Construct a permission from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A set of permissions, either granted to an agent or required by a tool.
///
/// Backed by a `BTreeSet` so iteration order (and therefore every list of
/// missing permissions reported in the audit log) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    inner: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Grant a permission to this set.
    pub fn grant(&mut self, permission: Permission) {
        self.inner.insert(permission);
    }

    /// Return true if the set contains the given permission.
    pub fn has(&self, permission: &Permission) -> bool {
        self.inner.contains(permission)
    }

    /// Return an iterator over all permissions in the set, in sorted order.
    pub fn all(&self) -> impl Iterator<Item = &Permission> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Return true if every permission in `self` is also in `granted`.
    pub fn is_subset(&self, granted: &PermissionSet) -> bool {
        self.inner.is_subset(&granted.inner)
    }

    /// The permissions in `self` that `granted` does not hold.
    pub fn missing_from(&self, granted: &PermissionSet) -> Vec<Permission> {
        self.inner.difference(&granted.inner).cloned().collect()
    }
}

impl<P: Into<String>> FromIterator<P> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|p| Permission::new(p)).collect(),
        }
    }
}

/// Render permissions as `[a, b]`, the form used in audit messages.
pub fn format_permissions(permissions: &[Permission]) -> String {
    let names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
    format!("[{}]", names.join(", "))
}
