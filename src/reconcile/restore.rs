//! Rebuild the store and links from the lockfile alone.

use std::collections::BTreeSet;

use log::{debug, warn};

use super::{group_entries, Context};
use crate::error::Result;
use crate::git::CloneResult;
use crate::linker;
use crate::lockfile::{self, LockEntry};
use crate::store;

/// Where a restored package's content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreSource {
    /// Already present in the store; nothing was fetched.
    Store,
    /// Fetched at the recorded commit.
    Commit,
    /// The recorded commit could not be fetched, so the tip of `ref` was
    /// fetched instead and placed under the recorded commit. The content may
    /// differ from what was originally pinned when `fetched_commit` differs
    /// from the entry's commit. The lockfile is left unchanged.
    Fallback { r#ref: String, fetched_commit: String },
}

impl RestoreSource {
    /// True if the content placed may not match the recorded commit.
    pub fn diverged(&self, recorded_commit: &str) -> bool {
        matches!(self, RestoreSource::Fallback { fetched_commit, .. } if fetched_commit != recorded_commit)
    }
}

/// One restored package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredPackage {
    pub key: String,
    pub entry: LockEntry,
    pub source: RestoreSource,
    pub links: Vec<String>,
}

/// What a restore run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreReport {
    /// Nothing is installed.
    EmptyLockfile,
    /// One result per entry, in processing order.
    Restored(Vec<RestoredPackage>),
}

/// Make the store and links match the lockfile.
///
/// Entries are grouped by `(org, repo, commit)`. A group whose store content
/// is complete is linked without fetching. Otherwise the commit is fetched
/// once for the group and the missing entries are placed from it; if the
/// commit cannot be fetched, the entry's ref is fetched instead (see
/// [`RestoreSource::Fallback`]).
pub fn restore(ctx: &Context<'_>) -> Result<RestoreReport> {
    let lock = lockfile::read_lock(ctx.root)?;
    if lock.is_empty() {
        return Ok(RestoreReport::EmptyLockfile);
    }

    let entries: Vec<(String, LockEntry)> = lock.packages.into_iter().collect();
    let groups = group_entries(entries, |e| (e.org.clone(), e.repo.clone(), e.commit.clone()));
    let mut restored = Vec::new();

    for ((org, repo, commit), entries) in groups {
        let missing: BTreeSet<&str> = entries
            .iter()
            .filter(|(_, entry)| !store::exists_in_store(ctx.root, &entry.store_location()))
            .map(|(key, _)| key.as_str())
            .collect();

        let fetched_source = match entries.iter().find(|(key, _)| missing.contains(key.as_str())) {
            None => {
                debug!("{}/{}@{} complete in store", org, repo, commit);
                None
            }
            Some((_, first)) => {
                // Entries sharing a commit were installed from refs that resolved to it
                let (fetched, source) = fetch_commit_or_ref(ctx, &org, &repo, &commit, &first.r#ref)?;
                for (key, entry) in &entries {
                    if missing.contains(key.as_str()) {
                        store::place_in_store(ctx.root, &entry.store_location(), fetched.path())?;
                    }
                }
                Some(source)
            }
        };

        for (key, entry) in &entries {
            let source = match &fetched_source {
                Some(source) if missing.contains(key.as_str()) => source.clone(),
                _ => RestoreSource::Store,
            };
            let store_dir = store::store_path(ctx.root, &entry.store_location());
            let links = linker::link(ctx.root, entry.package_type, &entry.name, &store_dir)?;
            restored.push(RestoredPackage {
                key: key.clone(),
                entry: entry.clone(),
                source,
                links,
            });
        }
    }

    Ok(RestoreReport::Restored(restored))
}

fn fetch_commit_or_ref(
    ctx: &Context<'_>,
    org: &str,
    repo: &str,
    commit: &str,
    ref_name: &str,
) -> Result<(CloneResult, RestoreSource)> {
    match ctx.git.clone_at_commit(org, repo, commit) {
        Ok(fetched) => Ok((fetched, RestoreSource::Commit)),
        Err(e) if e.is_fetch_error() => {
            warn!(
                "could not fetch {}/{} at {} ({}); falling back to {}",
                org, repo, commit, e, ref_name
            );
            let fetched = ctx.git.clone_shallow(org, repo, ref_name)?;
            let source = RestoreSource::Fallback {
                r#ref: ref_name.to_string(),
                fetched_commit: fetched.commit.clone(),
            };
            Ok((fetched, source))
        }
        Err(e) => Err(e),
    }
}
