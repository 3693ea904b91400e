//! # Content-Addressed Store
//!
//! Fetched package content lives under `<root>/.sibyl/store`, keyed by the
//! exact commit it was taken from:
//!
//! ```text
//! .sibyl/store/<org>/<repo>/<commit>/<path>
//! ```
//!
//! Content at a given location is write-once. It is only ever replaced
//! wholesale (when the same commit is placed again after a forced re-fetch)
//! or removed by uninstall. Because the key includes the commit, placing a new
//! version never disturbs the old one.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::defaults::{store_root, SIBYL_DIR};
use crate::error::{Error, Result};
use crate::filesystem;
use crate::gitignore;

/// Where one package version lives in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreLocation {
    pub org: String,
    pub repo: String,
    pub commit: String,
    pub path: String,
}

impl StoreLocation {
    pub fn new(org: &str, repo: &str, commit: &str, path: &str) -> Self {
        Self {
            org: org.to_string(),
            repo: repo.to_string(),
            commit: commit.to_string(),
            path: path.to_string(),
        }
    }
}

/// Build the store path for a package version. Pure, no I/O.
pub fn store_path(root: &Path, loc: &StoreLocation) -> PathBuf {
    store_root(root)
        .join(&loc.org)
        .join(&loc.repo)
        .join(&loc.commit)
        .join(&loc.path)
}

/// The store path for `loc`, refusing any location that would not stay
/// strictly below the store root.
fn contained_store_path(root: &Path, loc: &StoreLocation) -> Result<PathBuf> {
    let relative = Path::new(&loc.org)
        .join(&loc.repo)
        .join(&loc.commit)
        .join(&loc.path);
    let plain = [&loc.org, &loc.repo, &loc.commit, &loc.path]
        .iter()
        .all(|part| !part.is_empty())
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !plain {
        return Err(Error::Store {
            path: relative,
            message: "Location is outside the store".to_string(),
        });
    }
    Ok(store_root(root).join(relative))
}

/// Copy `source_dir/<loc.path>` into the store and return the store path.
///
/// Any content already at the destination is cleared first. The project
/// root `.gitignore` is updated so the store itself is never committed.
pub fn place_in_store(root: &Path, loc: &StoreLocation, source_dir: &Path) -> Result<PathBuf> {
    let src = source_dir.join(&loc.path);
    if !filesystem::path_exists(&src) {
        return Err(Error::Store {
            path: src,
            message: format!("'{}' does not exist in the fetched repository", loc.path),
        });
    }

    let dest = contained_store_path(root, loc)?;
    filesystem::remove_path(&dest).map_err(|e| Error::Store {
        path: dest.clone(),
        message: format!("Failed to clear existing content: {}", e),
    })?;
    filesystem::copy_tree(&src, &dest).map_err(|e| Error::Store {
        path: dest.clone(),
        message: format!("Failed to copy from {}: {}", src.display(), e),
    })?;
    debug!("placed {} in store at {}", loc.path, dest.display());

    ensure_store_ignored(root)?;
    Ok(dest)
}

/// Returns true if content exists at the store location.
pub fn exists_in_store(root: &Path, loc: &StoreLocation) -> bool {
    filesystem::path_exists(&store_path(root, loc))
}

/// Remove a package version from the store. Missing content is not an error.
///
/// Directories left empty between the removed entry and the store root are
/// pruned as well.
pub fn remove_from_store(root: &Path, loc: &StoreLocation) -> Result<()> {
    let dest = contained_store_path(root, loc)?;
    filesystem::remove_path(&dest).map_err(|e| Error::Store {
        path: dest.clone(),
        message: format!("Failed to remove: {}", e),
    })?;
    debug!("removed {} from store", dest.display());

    let top = store_root(root);
    let mut dir = dest.parent();
    while let Some(current) = dir {
        if current == top || !current.starts_with(&top) {
            break;
        }
        // Stops at the first directory that still has content
        if fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
    Ok(())
}

fn ensure_store_ignored(root: &Path) -> Result<()> {
    let entry = format!("{}/", SIBYL_DIR);
    let bare = format!("/{}", SIBYL_DIR);
    let anchored = format!("/{}/", SIBYL_DIR);
    gitignore::ensure_ignored(root, &entry, &[SIBYL_DIR, &bare, &anchored])
}
