//! # Linker
//!
//! Projects store entries into the consumption directory
//! (`<root>/.claude/{skills,agents,commands}`) as relative symlinks, and keeps
//! the managed section of each directory's `.gitignore` in step with the set
//! of linked names.
//!
//! ## Link names
//!
//! - A **skill** is a directory and is linked as a whole under its name.
//! - An **agent** or **command** is a set of markdown files. Each `.md` entry
//!   directly inside the store directory gets its own link. When there are
//!   none, the store path is taken to be a single markdown file and is linked
//!   as `<name>.md`.
//!
//! [`unlink_package`] recomputes the same names from the same inputs, since
//! nothing else records what was linked.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults::consumption_root;
use crate::error::{Error, Result};
use crate::filesystem;
use crate::gitignore;
use crate::spec::PackageType;

/// Directory links of the given type are created in.
pub fn target_dir(root: &Path, package_type: PackageType) -> PathBuf {
    consumption_root(root).join(package_type.type_dir())
}

/// Names of the links a package produces, relative to its target directory.
pub fn link_names(package_type: PackageType, name: &str, store_dir: &Path) -> Vec<String> {
    match package_type {
        PackageType::Skill => vec![name.to_string()],
        PackageType::Agent | PackageType::Command => {
            let md_files = markdown_entries(store_dir);
            if md_files.is_empty() {
                vec![format!("{}.md", name)]
            } else {
                md_files
            }
        }
    }
}

/// Link a store entry into the consumption directory and return the link
/// names that were created.
pub fn link(
    root: &Path,
    package_type: PackageType,
    name: &str,
    store_dir: &Path,
) -> Result<Vec<String>> {
    let dir = target_dir(root, package_type);
    fs::create_dir_all(&dir).map_err(|e| Error::Link {
        path: dir.clone(),
        message: format!("Failed to create directory: {}", e),
    })?;

    let names = link_names(package_type, name, store_dir);
    let link_paths = names
        .iter()
        .map(|link_name| link_path(&dir, link_name))
        .collect::<Result<Vec<_>>>()?;
    for (link_name, link_path) in names.iter().zip(&link_paths) {
        let target = match package_type {
            PackageType::Skill => store_dir.to_path_buf(),
            // The single-file fallback links the store path itself
            _ if store_dir.is_dir() => store_dir.join(link_name),
            _ => store_dir.to_path_buf(),
        };
        force_symlink(&target, link_path)?;
    }

    gitignore::add_entries(&dir, &names)?;
    Ok(names)
}

/// Remove the links a package produced. Missing links are not an error.
///
/// `store_dir` may already be gone, in which case the single `<name>.md`
/// link name is assumed for agents and commands.
pub fn unlink_package(
    root: &Path,
    package_type: PackageType,
    name: &str,
    store_dir: &Path,
) -> Result<Vec<String>> {
    let names = link_names(package_type, name, store_dir);
    unlink_names(root, package_type, &names)?;
    Ok(names)
}

/// Remove specific links from a type directory and deregister them.
pub fn unlink_names<S: AsRef<str>>(
    root: &Path,
    package_type: PackageType,
    names: &[S],
) -> Result<()> {
    let dir = target_dir(root, package_type);
    let link_paths = names
        .iter()
        .map(|name| link_path(&dir, name.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    for link_path in link_paths {
        filesystem::remove_path(&link_path).map_err(|e| Error::Link {
            path: link_path.clone(),
            message: format!("Failed to remove link: {}", e),
        })?;
        debug!("unlinked {}", link_path.display());
    }

    if dir.is_dir() {
        gitignore::remove_entries(&dir, names)?;
    }
    Ok(())
}

/// Path of the link `name` inside `dir`. The name must be a single plain
/// entry, otherwise the path could reach `dir` itself or leave it.
fn link_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::Link {
            path: dir.to_path_buf(),
            message: format!("Refusing to use '{}' as a link name", name),
        });
    }
    Ok(dir.join(name))
}

/// `.md` entries directly inside `dir`, sorted. Empty if `dir` is not a
/// readable directory.
fn markdown_entries(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".md"))
        .collect();
    names.sort();
    names
}

/// Replace whatever is at `link_path` with a relative symlink to `target`.
///
/// The old entry is removed before the new link is created, so an interrupted
/// run leaves the link absent rather than pointing somewhere stale.
fn force_symlink(target: &Path, link_path: &Path) -> Result<()> {
    let link_dir = link_path.parent().unwrap_or_else(|| Path::new("."));
    let relative = filesystem::relative_path(link_dir, target);

    filesystem::remove_path(link_path).map_err(|e| Error::Link {
        path: link_path.to_path_buf(),
        message: format!("Failed to remove existing entry: {}", e),
    })?;
    filesystem::create_symlink(&relative, link_path, target.is_dir()).map_err(|e| Error::Link {
        path: link_path.to_path_buf(),
        message: format!("Failed to create symlink to {}: {}", relative.display(), e),
    })?;

    debug!("linked {} -> {}", link_path.display(), relative.display());
    Ok(())
}
