//! # Error Handling
//!
//! This module defines the centralized error type for `sibyl`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the core can surface, each variant carrying enough context to print a
//! useful message.
//!
//! ## Taxonomy
//!
//! - **Validation**: a malformed package spec, update filter, lockfile entry
//!   or commit id. Raised before any state is touched.
//! - **Fetch**: `GitClone`, `GitCommand` and `GitTimeout`, produced by the git
//!   collaborator. Fatal for the affected group, except during restore where a
//!   failed fetch by commit falls back to a fetch by ref.
//! - **Filesystem**: `Store`, `Link`, `Lockfile` and the wrapped `Io` error.
//!   "Not found" on removal is never reported; it is treated as success.
//!
//! Conditions such as "already installed" or "no package with that name" are
//! not errors at all. They are reported through
//! [`crate::reconcile::Outcome`] values.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for sibyl operations
#[derive(Error, Debug)]
pub enum Error {
    /// A package spec, update filter or lockfile entry is malformed.
    #[error("Invalid \"{input}\": {message}")]
    Validation { input: String, message: String },

    /// Cloning a repository failed.
    ///
    /// Includes the repository URL, the ref or commit being fetched, the
    /// error message, and an optional hint for resolution.
    #[error("Git clone error for {url}@{r#ref}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// A git command other than the clone itself failed.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// A git command did not finish within its time budget and was killed.
    #[error("Git command timed out after {seconds}s for {url}: {command}")]
    GitTimeout {
        command: String,
        url: String,
        seconds: u64,
    },

    /// Placing, probing or removing store content failed.
    #[error("Store error at {}: {message}", path.display())]
    Store { path: PathBuf, message: String },

    /// Creating or removing a symlink, or rewriting an ignore file, failed.
    #[error("Link error at {}: {message}", path.display())]
    Link { path: PathBuf, message: String },

    /// The lockfile could not be read, parsed, or persisted.
    #[error("Lockfile error at {}: {message}", path.display())]
    Lockfile { path: PathBuf, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Returns true for errors raised by the git collaborator.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Error::GitClone { .. } | Error::GitCommand { .. } | Error::GitTimeout { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
