//! Move installed packages to the current tip of their ref.

use log::{debug, info};

use super::{group_entries, release_store, relink, Context, Outcome, PackageResult};
use crate::error::{Error, Result};
use crate::lockfile::{self, EntryFilter, LockEntry};
use crate::spec::{package_key, PackageType};
use crate::store::{self, StoreLocation};

/// Selects which lockfile entries an update touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateFilter {
    /// Every package from `org/repo`.
    Repo { org: String, repo: String },
    /// Exactly the package with this key.
    Key(String),
}

impl UpdateFilter {
    /// Parse `org/repo` or `org/repo/path...`. A trailing `@ref` is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |message: &str| Error::Validation {
            input: raw.to_string(),
            message: message.to_string(),
        };

        let trimmed = raw.trim();
        let without_ref = match trimmed.rfind('@') {
            Some(idx) if idx > 0 => &trimmed[..idx],
            _ => trimmed,
        };

        let parts: Vec<&str> = without_ref.splitn(3, '/').collect();
        match parts.as_slice() {
            [org, repo] | [org, repo, ""] if !org.is_empty() && !repo.is_empty() => {
                Ok(UpdateFilter::Repo {
                    org: org.to_string(),
                    repo: repo.to_string(),
                })
            }
            [org, repo, path] if !org.is_empty() && !repo.is_empty() => {
                Ok(UpdateFilter::Key(package_key(org, repo, path)))
            }
            [_] => Err(invalid("expected <org>/<repo> or <org>/<repo>/<path>")),
            _ => Err(invalid("org and repo are required")),
        }
    }

    pub fn matches(&self, entry: &LockEntry) -> bool {
        match self {
            UpdateFilter::Repo { org, repo } => entry.org == *org && entry.repo == *repo,
            UpdateFilter::Key(key) => entry.key() == *key,
        }
    }
}

/// What an update run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateReport {
    /// Nothing is installed.
    EmptyLockfile,
    /// Packages are installed but none matched the type and filter.
    NoMatches,
    /// One result per selected package, in processing order.
    Updated(Vec<PackageResult>),
}

/// Update installed packages of `package_type` (all types when `None`)
/// matching `filter` (all packages when `None`).
///
/// Selected entries are grouped by `(org, repo, ref)` and each group is
/// fetched exactly once. Entries already at the fetched commit are left
/// alone. Others are placed at the new commit, relinked, and have their
/// lockfile `commit` rewritten; the `ref` is kept.
pub fn update(
    ctx: &Context<'_>,
    package_type: Option<PackageType>,
    filter: Option<&str>,
) -> Result<UpdateReport> {
    let filter = filter.map(UpdateFilter::parse).transpose()?;

    let lock = lockfile::read_lock(ctx.root)?;
    if lock.is_empty() {
        return Ok(UpdateReport::EmptyLockfile);
    }

    let selected: Vec<(String, LockEntry)> = lockfile::find_entries(
        &lock,
        &EntryFilter {
            package_type,
            name: None,
        },
    )
    .into_iter()
    .filter(|(_, entry)| filter.as_ref().map_or(true, |f| f.matches(entry)))
    .collect();
    if selected.is_empty() {
        return Ok(UpdateReport::NoMatches);
    }

    let groups = group_entries(selected, |e| (e.org.clone(), e.repo.clone(), e.r#ref.clone()));
    let mut results = Vec::new();

    for ((org, repo, ref_name), entries) in groups {
        let fetched = ctx.git.clone_shallow(&org, &repo, &ref_name)?;

        for (key, entry) in entries {
            if entry.commit == fetched.commit {
                debug!("{} is current at {}", key, entry.commit);
                results.push(PackageResult {
                    key,
                    previous_commit: Some(entry.commit.clone()),
                    entry,
                    outcome: Outcome::AlreadyCurrent,
                    links: Vec::new(),
                });
                continue;
            }

            let loc = StoreLocation::new(&org, &repo, &fetched.commit, &entry.path);
            let store_dir = store::place_in_store(ctx.root, &loc, fetched.path())?;

            let mut updated = entry.clone();
            updated.commit = fetched.commit.clone();
            let links = relink(ctx, &updated, &store_dir, Some(&entry))?;
            let lock = lockfile::add_entry(ctx.root, &key, updated.clone())?;
            release_store(ctx, &entry, &lock)?;
            info!("updated {} {} -> {}", key, entry.commit, updated.commit);

            results.push(PackageResult {
                key,
                entry: updated,
                outcome: Outcome::Applied,
                previous_commit: Some(entry.commit),
                links,
            });
        }
    }

    Ok(UpdateReport::Updated(results))
}
