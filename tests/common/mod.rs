//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_installed_dir(
//!         PackageType::Skill,
//!         "acme/tools/skills/lint-fix",
//!         "aabbccdd",
//!         &[("SKILL.md", "# Lint Fix")],
//!     );
//!     fixture.command().arg("i").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

use sibyl::lockfile::{self, LockEntry};
use sibyl::spec::{PackageSpec, PackageType};
use sibyl::store::{self, StoreLocation};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;
    #[allow(unused_imports)]
    pub use sibyl::spec::PackageType;

    pub use super::TestFixture;
}

/// A project directory, optionally seeded with installed packages.
///
/// Seeding writes store content and lockfile entries directly, so tests can
/// exercise restore, list and uninstall without git or network access.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Record a directory package (a skill, or an agent/command folder) as
    /// installed at `commit`, with `files` inside its store directory.
    pub fn with_installed_dir(
        self,
        package_type: PackageType,
        key: &str,
        commit: &str,
        files: &[(&str, &str)],
    ) -> Self {
        let entry = self.entry(package_type, key, commit);
        let dir = self.store_dir(&entry);
        for (name, content) in files {
            std::fs::create_dir_all(&dir).expect("Failed to create store directory");
            std::fs::write(dir.join(name), content).expect("Failed to write store file");
        }
        self.record(entry)
    }

    /// Record a single-file package (`.../<name>.md`) as installed at `commit`.
    pub fn with_installed_file(
        self,
        package_type: PackageType,
        key: &str,
        commit: &str,
        content: &str,
    ) -> Self {
        let entry = self.entry(package_type, key, commit);
        let file = self.store_dir(&entry);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create store directory");
        }
        std::fs::write(&file, content).expect("Failed to write store file");
        self.record(entry)
    }

    /// Record a lockfile entry without any store content.
    #[allow(dead_code)]
    pub fn with_locked_only(self, package_type: PackageType, key: &str, commit: &str) -> Self {
        let entry = self.entry(package_type, key, commit);
        self.record(entry)
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Path of a link under `.claude/<type_dir>/`.
    #[allow(dead_code)]
    pub fn link_path(&self, type_dir: &str, name: &str) -> PathBuf {
        self.path().join(".claude").join(type_dir).join(name)
    }

    /// Store path for `key` at `commit`.
    #[allow(dead_code)]
    pub fn store_path(&self, key: &str, commit: &str) -> PathBuf {
        let spec = PackageSpec::parse(key).expect("valid key");
        store::store_path(
            self.path(),
            &StoreLocation::new(&spec.org, &spec.repo, commit, &spec.path),
        )
    }

    fn entry(&self, package_type: PackageType, key: &str, commit: &str) -> LockEntry {
        let spec = PackageSpec::parse(key).expect("valid key");
        LockEntry {
            package_type,
            name: spec.name(),
            org: spec.org,
            repo: spec.repo,
            path: spec.path,
            r#ref: spec.r#ref,
            commit: commit.to_string(),
        }
    }

    fn store_dir(&self, entry: &LockEntry) -> PathBuf {
        store::store_path(self.path(), &entry.store_location())
    }

    fn record(self, entry: LockEntry) -> Self {
        lockfile::add_entry(self.path(), &entry.key(), entry).expect("Failed to write lockfile");
        self
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command configured to run in this fixture's directory with
    /// plain output and no inherited sibyl settings.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sibyl");
        cmd.current_dir(self.path())
            .env("NO_COLOR", "1")
            .env_remove("SIBYL_ROOT")
            .env_remove("SIBYL_GIT_BASE_URL")
            .env_remove("SIBYL_GIT_TIMEOUT")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_seeds_store_and_lockfile() {
        let fixture = TestFixture::new().with_installed_dir(
            PackageType::Skill,
            "acme/tools/skills/lint-fix",
            "c1",
            &[("SKILL.md", "# Lint Fix")],
        );

        assert!(fixture
            .store_path("acme/tools/skills/lint-fix", "c1")
            .join("SKILL.md")
            .exists());
        let lock = lockfile::read_lock(fixture.path()).unwrap();
        assert_eq!(lock.get("acme/tools/skills/lint-fix").unwrap().name, "lint-fix");
    }
}
