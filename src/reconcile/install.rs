//! Install one package at the tip of its ref.

use log::debug;

use super::{release_store, relink, Context, Outcome, PackageResult};
use crate::error::Result;
use crate::lockfile::{self, LockEntry};
use crate::spec::{PackageSpec, PackageType};
use crate::store::{self, StoreLocation};

/// Install `raw_spec` as a package of `package_type`.
///
/// An entry already pinned from the same ref is left alone and reported as
/// [`Outcome::AlreadyCurrent`] without fetching. Otherwise the ref is fetched,
/// the package path is placed in the store under the fetched commit, linked,
/// and recorded (overwriting any previous entry for the same key). Store
/// content of the replaced version is removed once nothing else uses it.
pub fn install(ctx: &Context<'_>, package_type: PackageType, raw_spec: &str) -> Result<PackageResult> {
    let spec = PackageSpec::parse(raw_spec)?;
    let key = spec.key();

    let previous = lockfile::read_lock(ctx.root)?.get(&key).cloned();
    if let Some(existing) = &previous {
        if existing.r#ref == spec.r#ref && existing.package_type == package_type {
            debug!("{} already installed at {}", key, existing.commit);
            return Ok(PackageResult {
                key,
                entry: existing.clone(),
                outcome: Outcome::AlreadyCurrent,
                previous_commit: Some(existing.commit.clone()),
                links: Vec::new(),
            });
        }
    }

    let fetched = ctx.git.clone_shallow(&spec.org, &spec.repo, &spec.r#ref)?;
    let loc = StoreLocation::new(&spec.org, &spec.repo, &fetched.commit, &spec.path);
    let store_dir = store::place_in_store(ctx.root, &loc, fetched.path())?;

    let entry = LockEntry {
        package_type,
        org: spec.org.clone(),
        repo: spec.repo.clone(),
        path: spec.path.clone(),
        r#ref: spec.r#ref.clone(),
        commit: fetched.commit.clone(),
        name: spec.name(),
    };
    let links = relink(ctx, &entry, &store_dir, previous.as_ref())?;
    let lock = lockfile::add_entry(ctx.root, &key, entry.clone())?;
    if let Some(previous) = &previous {
        release_store(ctx, previous, &lock)?;
    }

    Ok(PackageResult {
        key,
        entry,
        outcome: Outcome::Applied,
        previous_commit: previous.map(|p| p.commit),
        links,
    })
}
