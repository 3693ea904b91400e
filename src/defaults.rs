//! Default values for sibyl.
//!
//! This module provides centralized names, paths and limits used across the
//! library and the CLI, ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the project root that holds everything sibyl owns.
pub const SIBYL_DIR: &str = ".sibyl";

/// Store directory inside [`SIBYL_DIR`].
pub const STORE_DIR: &str = "store";

/// Consumption root the linker projects packages into.
pub const CONSUMPTION_DIR: &str = ".claude";

/// File name of the lockfile at the project root.
pub const LOCKFILE_NAME: &str = "sibyl-lock.json";

/// Header line that opens the managed section of a `.gitignore`.
pub const GITIGNORE_HEADER: &str = "# managed by sibyl";

/// Ref used when a spec does not carry `@<ref>`.
pub const DEFAULT_REF: &str = "main";

/// Base URL repositories are cloned from: `<base>/<org>/<repo>.git`.
pub const DEFAULT_GIT_BASE_URL: &str = "https://github.com";

/// Time budget for network git commands (clone, fetch).
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Time budget for local git plumbing (init, remote add, checkout, rev-parse).
pub const LOCAL_GIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the store root for a project: `<root>/.sibyl/store`.
pub fn store_root(root: &Path) -> PathBuf {
    root.join(SIBYL_DIR).join(STORE_DIR)
}

/// Returns the consumption root for a project: `<root>/.claude`.
pub fn consumption_root(root: &Path) -> PathBuf {
    root.join(CONSUMPTION_DIR)
}

/// Returns the lockfile path for a project: `<root>/sibyl-lock.json`.
pub fn lockfile_path(root: &Path) -> PathBuf {
    root.join(LOCKFILE_NAME)
}
