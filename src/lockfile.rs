//! # Lockfile
//!
//! `sibyl-lock.json` is the source of truth for what is installed. It maps
//! each package key (`org/repo/path`) to the commit the package is pinned to:
//!
//! ```json
//! {
//!   "packages": {
//!     "acme/tools/skills/lint-fix": {
//!       "type": "skill",
//!       "org": "acme",
//!       "repo": "tools",
//!       "path": "skills/lint-fix",
//!       "ref": "main",
//!       "commit": "aabbccdd11223344",
//!       "name": "lint-fix"
//!     }
//!   }
//! }
//! ```
//!
//! Writes go to a private temporary file next to the lockfile which is then
//! renamed over it, so a reader never sees a half-written file and a crash
//! mid-write leaves the previous lockfile intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use crate::defaults::lockfile_path;
use crate::error::{Error, Result};
use crate::spec::{check_ref, check_relative_path, check_segment, package_key, PackageType};
use crate::store::StoreLocation;

/// One pinned package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    #[serde(rename = "type")]
    pub package_type: PackageType,
    pub org: String,
    pub repo: String,
    pub path: String,
    #[serde(rename = "ref")]
    pub r#ref: String,
    pub commit: String,
    pub name: String,
}

impl LockEntry {
    /// The key this entry is stored under.
    pub fn key(&self) -> String {
        package_key(&self.org, &self.repo, &self.path)
    }

    /// Where this entry's pinned content lives in the store.
    pub fn store_location(&self) -> StoreLocation {
        StoreLocation::new(&self.org, &self.repo, &self.commit, &self.path)
    }

    /// Check that every field joined into a filesystem path or handed to git
    /// is safe to use. `key` only labels the error.
    pub fn validate(&self, key: &str) -> Result<()> {
        check_segment(key, "org", &self.org)?;
        check_segment(key, "repo", &self.repo)?;
        check_relative_path(key, "path", &self.path)?;
        check_segment(key, "name", &self.name)?;
        check_ref(key, &self.r#ref)?;
        if self.commit.is_empty() || !self.commit.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Validation {
                input: key.to_string(),
                message: format!("commit '{}' is not a commit id", self.commit),
            });
        }
        Ok(())
    }
}

/// The whole lockfile. Absence of a key means "not installed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub packages: BTreeMap<String, LockEntry>,
}

impl Lockfile {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn get(&self, key: &str) -> Option<&LockEntry> {
        self.packages.get(key)
    }
}

/// Optional filters for [`find_entries`].
#[derive(Debug, Clone, Default)]
pub struct EntryFilter<'a> {
    pub package_type: Option<PackageType>,
    pub name: Option<&'a str>,
}

/// Read the lockfile, or an empty one if it does not exist.
pub fn read_lock(root: &Path) -> Result<Lockfile> {
    let path = lockfile_path(root);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Lockfile::default()),
        Err(e) => {
            return Err(Error::Lockfile {
                path,
                message: format!("Failed to read: {}", e),
            })
        }
    };

    let lock: Lockfile = serde_json::from_str(&raw).map_err(|e| Error::Lockfile {
        path,
        message: format!("Failed to parse: {}", e),
    })?;
    for (key, entry) in &lock.packages {
        entry.validate(key)?;
    }
    Ok(lock)
}

/// Persist the lockfile atomically.
pub fn write_lock(root: &Path, lock: &Lockfile) -> Result<()> {
    let path = lockfile_path(root);
    let mut content = serde_json::to_string_pretty(lock)?;
    content.push('\n');

    let dir = path.parent().unwrap_or(root);
    let persist_error = |message: String| Error::Lockfile {
        path: path.clone(),
        message,
    };

    let mut tmp = Builder::new()
        .prefix(".sibyl-lock-")
        .tempfile_in(dir)
        .map_err(|e| persist_error(format!("Failed to create temporary file: {}", e)))?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| persist_error(format!("Failed to write temporary file: {}", e)))?;
    tmp.persist(&path)
        .map_err(|e| persist_error(format!("Failed to replace lockfile: {}", e.error)))?;

    debug!("wrote {} ({} packages)", path.display(), lock.len());
    Ok(())
}

/// Insert or overwrite the entry at `key` and persist.
pub fn add_entry(root: &Path, key: &str, entry: LockEntry) -> Result<Lockfile> {
    let mut lock = read_lock(root)?;
    lock.packages.insert(key.to_string(), entry);
    write_lock(root, &lock)?;
    Ok(lock)
}

/// Remove the entry at `key` and persist. A missing key is a no-op.
pub fn remove_entry(root: &Path, key: &str) -> Result<Lockfile> {
    let mut lock = read_lock(root)?;
    if lock.packages.remove(key).is_some() {
        write_lock(root, &lock)?;
    }
    Ok(lock)
}

/// Entries matching the filter, in key order.
pub fn find_entries(lock: &Lockfile, filter: &EntryFilter<'_>) -> Vec<(String, LockEntry)> {
    lock.packages
        .iter()
        .filter(|(_, entry)| filter.package_type.map_or(true, |t| entry.package_type == t))
        .filter(|(_, entry)| filter.name.map_or(true, |n| entry.name == n))
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(package_type: PackageType, path: &str, name: &str) -> LockEntry {
        LockEntry {
            package_type,
            org: "acme".to_string(),
            repo: "tools".to_string(),
            path: path.to_string(),
            r#ref: "main".to_string(),
            commit: "aabbccdd11223344".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_read_missing_returns_empty() {
        let temp = TempDir::new().unwrap();
        let lock = read_lock(temp.path()).unwrap();
        assert!(lock.is_empty());
    }

    #[test]
    fn test_read_invalid_json_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(lockfile_path(temp.path()), "{ not json").unwrap();
        let err = read_lock(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Lockfile { .. }));
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let temp = TempDir::new().unwrap();
        let mut lock = Lockfile::default();
        let e = entry(PackageType::Skill, "skills/lint-fix", "lint-fix");
        lock.packages.insert(e.key(), e);

        write_lock(temp.path(), &lock).unwrap();

        assert_eq!(read_lock(temp.path()).unwrap(), lock);
    }

    #[test]
    fn test_write_format() {
        let temp = TempDir::new().unwrap();
        let mut lock = Lockfile::default();
        let e = entry(PackageType::Skill, "skills/lint-fix", "lint-fix");
        lock.packages.insert(e.key(), e);

        write_lock(temp.path(), &lock).unwrap();

        let raw = fs::read_to_string(lockfile_path(temp.path())).unwrap();
        let expected = r#"{
  "packages": {
    "acme/tools/skills/lint-fix": {
      "type": "skill",
      "org": "acme",
      "repo": "tools",
      "path": "skills/lint-fix",
      "ref": "main",
      "commit": "aabbccdd11223344",
      "name": "lint-fix"
    }
  }
}
"#;
        assert_eq!(raw, expected);
    }

    #[test]
    fn test_write_leaves_no_temporary_files() {
        let temp = TempDir::new().unwrap();
        write_lock(temp.path(), &Lockfile::default()).unwrap();
        write_lock(temp.path(), &Lockfile::default()).unwrap();

        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["sibyl-lock.json".to_string()]);
    }

    #[test]
    fn test_read_accepts_missing_packages_field() {
        let temp = TempDir::new().unwrap();
        fs::write(lockfile_path(temp.path()), "{}").unwrap();
        assert!(read_lock(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_add_entry_inserts_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let e = entry(PackageType::Skill, "skills/lint-fix", "lint-fix");
        let key = e.key();

        add_entry(temp.path(), &key, e.clone()).unwrap();
        let mut updated = e;
        updated.commit = "ffff0000".to_string();
        let lock = add_entry(temp.path(), &key, updated).unwrap();

        assert_eq!(lock.len(), 1);
        assert_eq!(read_lock(temp.path()).unwrap().get(&key).unwrap().commit, "ffff0000");
    }

    #[test]
    fn test_remove_entry() {
        let temp = TempDir::new().unwrap();
        let e = entry(PackageType::Skill, "skills/lint-fix", "lint-fix");
        let key = e.key();
        add_entry(temp.path(), &key, e).unwrap();

        let lock = remove_entry(temp.path(), &key).unwrap();
        assert!(lock.is_empty());
        assert!(read_lock(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_entry_is_noop() {
        let temp = TempDir::new().unwrap();
        let lock = remove_entry(temp.path(), "acme/tools/nothing").unwrap();
        assert!(lock.is_empty());
        assert!(!lockfile_path(temp.path()).exists());
    }

    #[test]
    fn test_find_entries_filters() {
        let mut lock = Lockfile::default();
        for e in [
            entry(PackageType::Skill, "skills/a", "a"),
            entry(PackageType::Agent, "agents/a.md", "a"),
            entry(PackageType::Command, "commands/deploy", "deploy"),
        ] {
            lock.packages.insert(e.key(), e);
        }

        assert_eq!(find_entries(&lock, &EntryFilter::default()).len(), 3);

        let skills = find_entries(
            &lock,
            &EntryFilter {
                package_type: Some(PackageType::Skill),
                name: None,
            },
        );
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].0, "acme/tools/skills/a");

        let named_a = find_entries(
            &lock,
            &EntryFilter {
                package_type: None,
                name: Some("a"),
            },
        );
        assert_eq!(named_a.len(), 2);

        let agent_a = find_entries(
            &lock,
            &EntryFilter {
                package_type: Some(PackageType::Agent),
                name: Some("a"),
            },
        );
        assert_eq!(agent_a.len(), 1);
        assert_eq!(agent_a[0].1.path, "agents/a.md");
    }

    fn write_raw_entry(root: &Path, field: &str, value: &str) {
        let mut e = serde_json::to_value(entry(PackageType::Skill, "skills/a", "a")).unwrap();
        e[field] = serde_json::Value::String(value.to_string());
        let raw = serde_json::json!({ "packages": { "acme/tools/skills/a": e } });
        fs::write(lockfile_path(root), raw.to_string()).unwrap();
    }

    #[test]
    fn test_read_rejects_path_traversal() {
        let temp = TempDir::new().unwrap();
        for (field, value) in [
            ("path", "../../../../../victim"),
            ("path", "/etc"),
            ("path", "skills/a/"),
            ("org", ".."),
            ("repo", "a/b"),
            ("name", ""),
            ("name", "../x"),
        ] {
            write_raw_entry(temp.path(), field, value);
            let err = read_lock(temp.path()).unwrap_err();
            assert!(
                matches!(err, Error::Validation { .. }),
                "accepted {field} = {value}: {err}"
            );
        }
    }

    #[test]
    fn test_read_rejects_option_like_commit_and_ref() {
        let temp = TempDir::new().unwrap();
        for (field, value) in [
            ("commit", "--upload-pack=touch /tmp/x"),
            ("commit", "../c1"),
            ("commit", ""),
            ("ref", "-main"),
        ] {
            write_raw_entry(temp.path(), field, value);
            assert!(
                matches!(read_lock(temp.path()), Err(Error::Validation { .. })),
                "accepted {field} = {value}"
            );
        }
    }

    #[test]
    fn test_validate_accepts_written_entries() {
        let e = entry(PackageType::Agent, "agents/team/review.md", "review");
        assert!(e.validate(&e.key()).is_ok());
    }

    #[test]
    fn test_store_location_from_entry() {
        let e = entry(PackageType::Skill, "skills/a", "a");
        assert_eq!(
            e.store_location(),
            StoreLocation::new("acme", "tools", "aabbccdd11223344", "skills/a")
        );
    }
}
