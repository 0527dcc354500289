//! Label maps, purge exemption filtering, and list-filter expressions.
//!
//! Labels are the sole identity and ownership mechanism: every managed VM and
//! disk carries `pool`, every managed disk and snapshot carries `vm`, and a
//! logical snapshot is the set of snapshot resources sharing `snapshot_name`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label key identifying the owning pool.
pub const POOL: &str = "pool";
/// Label key identifying the owning VM.
pub const VM: &str = "vm";
/// Label key carrying the logical snapshot name shared by one snapshot set.
pub const SNAPSHOT_NAME: &str = "snapshot_name";
/// Label key recording the disk a snapshot was taken from.
pub const DISKNAME: &str = "diskname";
/// Label key recording whether the snapshotted disk was bootable.
pub const BOOT: &str = "boot";

/// Key/value tags attached to a remote resource.
///
/// The required keys have typed accessors; unknown keys pass through
/// untouched so resources labelled by other tooling keep their tags across
/// label-mutating calls.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Creates an empty label set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds the label set carried by managed VMs and disks.
    #[must_use]
    pub fn for_instance(vm: &str, pool: &str) -> Self {
        Self::new().with(VM, vm).with(POOL, pool)
    }

    /// Builds the label set carried by managed disks.
    #[must_use]
    pub fn for_disk(vm: &str, pool: &str) -> Self {
        Self::for_instance(vm, pool)
    }

    /// Builds the label set carried by one member of a snapshot set.
    #[must_use]
    pub fn for_snapshot(snapshot: &str, vm: &str, pool: &str, diskname: &str, boot: bool) -> Self {
        Self::for_instance(vm, pool)
            .with(SNAPSHOT_NAME, snapshot)
            .with(DISKNAME, diskname)
            .with(BOOT, if boot { "true" } else { "false" })
    }

    /// Adds a label, replacing any existing value for the key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Inserts a label in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merges `other` into this set, overwriting colliding keys.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Looks up a label value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the owning pool name, when labelled.
    #[must_use]
    pub fn pool(&self) -> Option<&str> {
        self.get(POOL)
    }

    /// Returns the owning VM name, when labelled.
    #[must_use]
    pub fn vm(&self) -> Option<&str> {
        self.get(VM)
    }

    /// Returns the logical snapshot name, when labelled.
    #[must_use]
    pub fn snapshot_name(&self) -> Option<&str> {
        self.get(SNAPSHOT_NAME)
    }

    /// Returns the recorded disk name, when labelled.
    #[must_use]
    pub fn diskname(&self) -> Option<&str> {
        self.get(DISKNAME)
    }

    /// Returns whether the `boot` label records a bootable disk.
    ///
    /// Any value other than the string `"true"` (including an absent label)
    /// reads as non-bootable.
    #[must_use]
    pub fn boot_flag(&self) -> bool {
        self.get(BOOT) == Some("true")
    }

    /// Returns true when the set carries no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the labels in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

/// Decides whether a resource is exempt from purging.
///
/// `None` exempts nothing. Otherwise a resource is exempt when its `pool`
/// label appears verbatim in the allow-list, when the list contains the
/// empty-string sentinel and the resource has no `pool` label at all, or when
/// any `key=value` entry matches one of the resource's label pairs exactly.
///
/// Entries are lower-cased into a private copy before matching (labels cannot
/// contain uppercase); the caller's list is never modified.
#[must_use]
pub fn should_ignore(labels: &Labels, allow_list: Option<&[String]>) -> bool {
    let Some(entries) = allow_list else {
        return false;
    };
    let lowered: Vec<String> = entries.iter().map(|entry| entry.to_lowercase()).collect();

    match labels.pool() {
        Some(pool) if lowered.iter().any(|entry| entry == pool) => return true,
        None if lowered.iter().any(String::is_empty) => return true,
        _ => {}
    }

    lowered.iter().any(|entry| {
        entry
            .split_once('=')
            .is_some_and(|(key, value)| labels.get(key) == Some(value))
    })
}

/// Builder for remote list-filter expressions.
///
/// The grammar is a conjunction of `(labels.K = V)` / `(labels.K != V)`
/// clauses, optionally combined with `OR -labels.K:*` to also match resources
/// missing the label entirely.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FilterExpression {
    clauses: Vec<String>,
    missing: Option<String>,
}

impl FilterExpression {
    /// Creates an empty expression.
    #[must_use]
    pub const fn new() -> Self {
        Self { clauses: Vec::new(), missing: None }
    }

    /// Requires the label `key` to equal `value`.
    #[must_use]
    pub fn eq(mut self, key: &str, value: &str) -> Self {
        self.clauses.push(format!("(labels.{key} = {value})"));
        self
    }

    /// Requires the label `key` to differ from `value`.
    #[must_use]
    pub fn ne(mut self, key: &str, value: &str) -> Self {
        self.clauses.push(format!("(labels.{key} != {value})"));
        self
    }

    /// Also matches resources that carry no `key` label at all.
    #[must_use]
    pub fn or_missing(mut self, key: &str) -> Self {
        self.missing = Some(key.to_owned());
        self
    }

    /// Renders the expression.
    #[must_use]
    pub fn build(&self) -> String {
        let conjunction = self.clauses.join(" AND ");
        match &self.missing {
            Some(key) if conjunction.is_empty() => format!("-labels.{key}:*"),
            Some(key) => format!("{conjunction} OR -labels.{key}:*"),
            None => conjunction,
        }
    }
}
