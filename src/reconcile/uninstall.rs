//! Remove an installed package.

use log::debug;

use super::{release_store, Context, Outcome};
use crate::error::Result;
use crate::linker;
use crate::lockfile::{self, EntryFilter, LockEntry};
use crate::spec::PackageType;
use crate::store;

/// What an uninstall run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    /// [`Outcome::Applied`] when something was removed, otherwise
    /// [`Outcome::NotFound`].
    pub outcome: Outcome,
    pub removed: Vec<(String, LockEntry)>,
}

/// Uninstall every package of `package_type` named `name`.
///
/// For each match the links are removed, then its lockfile entry, then its
/// store content unless another entry still uses it. No match is reported as [`Outcome::NotFound`], not as an
/// error.
pub fn uninstall(ctx: &Context<'_>, package_type: PackageType, name: &str) -> Result<UninstallReport> {
    let lock = lockfile::read_lock(ctx.root)?;
    let matches = lockfile::find_entries(
        &lock,
        &EntryFilter {
            package_type: Some(package_type),
            name: Some(name),
        },
    );
    if matches.is_empty() {
        return Ok(UninstallReport {
            outcome: Outcome::NotFound,
            removed: Vec::new(),
        });
    }

    for (key, entry) in &matches {
        let loc = entry.store_location();
        let store_dir = store::store_path(ctx.root, &loc);
        linker::unlink_package(ctx.root, entry.package_type, &entry.name, &store_dir)?;
        let remaining = lockfile::remove_entry(ctx.root, key)?;
        release_store(ctx, entry, &remaining)?;
        debug!("uninstalled {}", key);
    }

    Ok(UninstallReport {
        outcome: Outcome::Applied,
        removed: matches,
    })
}
