//! # Sibyl Library
//!
//! This library provides the core of the `sibyl` package manager: it fetches
//! named sub-trees ("skills", "agents", "commands") from git repositories,
//! pins each to an exact commit, and projects them into `.claude/` through
//! symlinks, with `sibyl-lock.json` as the record of what is installed.
//!
//! ## Quick Example
//!
//! ```
//! use sibyl::spec::{PackageSpec, PackageType};
//!
//! let spec = PackageSpec::parse("acme/tools/agents/reviewer.md@v2").unwrap();
//! assert_eq!(spec.key(), "acme/tools/agents/reviewer.md");
//! assert_eq!(spec.name(), "reviewer");
//! assert_eq!(spec.r#ref, "v2");
//! assert_eq!(PackageType::Agent.type_dir(), "agents");
//! ```
//!
//! ## Core Concepts
//!
//! - **Store (`store`)**: fetched content at
//!   `.sibyl/store/<org>/<repo>/<commit>/<path>`. A location is written once
//!   and never modified in place.
//! - **Linker (`linker`, `gitignore`)**: relative symlinks from
//!   `.claude/<type>/` into the store, each registered in a tool-managed
//!   section of that directory's `.gitignore`.
//! - **Lockfile (`lockfile`)**: the key → pinned entry map, persisted
//!   atomically.
//! - **Git (`repository`, `git`)**: the [`repository::GitOperations`] seam
//!   and its implementation over the system `git` binary.
//! - **Reconciliation (`reconcile`)**: install, update, restore, uninstall
//!   and list, grouping work so a repository state is fetched at most once.
//!
//! ## Execution Flow
//!
//! Every reconcile operation follows the same path: read the lockfile,
//! decide which repository states need fetching, fetch each once, place the
//! requested paths in the store, link them, and record each package in the
//! lockfile as soon as it is done. Re-running an interrupted operation picks
//! up where it stopped.

pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod gitignore;
pub mod linker;
pub mod lockfile;
pub mod output;
pub mod reconcile;
pub mod repository;
pub mod spec;
pub mod store;
pub mod suggestions;

#[cfg(test)]
mod spec_proptest;
