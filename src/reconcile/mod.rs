//! # Reconciliation
//!
//! The operations that bring the project directory in line with what the user
//! asked for, using the lockfile as the source of truth:
//!
//! - [`install()`]: pin one package at the tip of its ref.
//! - [`update()`]: move selected packages to the current tip of their ref.
//! - [`restore()`]: rebuild the store and links from the lockfile alone.
//! - [`uninstall()`]: remove links, store content and lockfile entry.
//! - [`list()`]: read the lockfile.
//!
//! Every operation runs against an explicit [`Context`]. Fetches go through
//! the context's [`GitOperations`] and are grouped so that one repository
//! state is fetched at most once per run. The lockfile is written after each
//! package, so an interrupted run leaves every finished package recorded and
//! re-running converges.

pub mod install;
pub mod restore;
pub mod uninstall;
pub mod update;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::linker;
use crate::lockfile::{self, EntryFilter, LockEntry, Lockfile};
use crate::repository::GitOperations;
use crate::spec::PackageType;
use crate::store::{self, StoreLocation};

pub use install::install;
pub use restore::{restore, RestoreReport, RestoreSource, RestoredPackage};
pub use uninstall::{uninstall, UninstallReport};
pub use update::{update, UpdateFilter, UpdateReport};

/// Everything an operation needs: the project root and the git collaborator.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub root: &'a Path,
    pub git: &'a dyn GitOperations,
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Path, git: &'a dyn GitOperations) -> Self {
        Self { root, git }
    }
}

/// What happened to one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Content was fetched, placed, linked and recorded.
    Applied,
    /// The lockfile already matched; nothing was touched.
    AlreadyCurrent,
    /// No installed package matched.
    NotFound,
}

/// Result of installing or updating one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResult {
    pub key: String,
    /// The entry as recorded after the operation.
    pub entry: LockEntry,
    pub outcome: Outcome,
    /// Commit the entry was pinned to before, if it existed.
    pub previous_commit: Option<String>,
    /// Link names created in the type directory (empty when nothing changed).
    pub links: Vec<String>,
}

/// Installed packages, optionally restricted to one type, in key order.
pub fn list(ctx: &Context<'_>, package_type: Option<PackageType>) -> Result<Vec<(String, LockEntry)>> {
    let lock = lockfile::read_lock(ctx.root)?;
    Ok(lockfile::find_entries(
        &lock,
        &EntryFilter {
            package_type,
            name: None,
        },
    ))
}

/// Group entries by `group_key`. Groups come out in sorted key order; entries
/// within a group keep their input order.
pub(crate) fn group_entries<K, F>(
    entries: Vec<(String, LockEntry)>,
    group_key: F,
) -> BTreeMap<K, Vec<(String, LockEntry)>>
where
    K: Ord,
    F: Fn(&LockEntry) -> K,
{
    let mut groups: BTreeMap<K, Vec<(String, LockEntry)>> = BTreeMap::new();
    for (key, entry) in entries {
        groups.entry(group_key(&entry)).or_default().push((key, entry));
    }
    groups
}

/// Link `entry` from `store_dir`, then drop links that `previous` produced
/// and `entry` no longer does.
pub(crate) fn relink(
    ctx: &Context<'_>,
    entry: &LockEntry,
    store_dir: &Path,
    previous: Option<&LockEntry>,
) -> Result<Vec<String>> {
    let stale_before = previous.map(|prev| {
        let prev_dir = store::store_path(ctx.root, &prev.store_location());
        linker::link_names(prev.package_type, &prev.name, &prev_dir)
    });

    let names = linker::link(ctx.root, entry.package_type, &entry.name, store_dir)?;

    if let (Some(prev), Some(old_names)) = (previous, stale_before) {
        let stale: Vec<String> = old_names
            .into_iter()
            .filter(|n| prev.package_type != entry.package_type || !names.contains(n))
            .collect();
        if !stale.is_empty() {
            linker::unlink_names(ctx.root, prev.package_type, &stale)?;
        }
    }
    Ok(names)
}

/// Remove the store content `released` pointed at, unless an entry in `lock`
/// still uses it or content nested inside or around it.
pub(crate) fn release_store(ctx: &Context<'_>, released: &LockEntry, lock: &Lockfile) -> Result<()> {
    let loc = released.store_location();
    if lock
        .packages
        .values()
        .any(|entry| shares_content(&entry.store_location(), &loc))
    {
        return Ok(());
    }
    store::remove_from_store(ctx.root, &loc)
}

fn shares_content(a: &StoreLocation, b: &StoreLocation) -> bool {
    a.org == b.org
        && a.repo == b.repo
        && a.commit == b.commit
        && (is_within(&a.path, &b.path) || is_within(&b.path, &a.path))
}

fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}
