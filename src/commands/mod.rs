//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `sibyl`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments, derived
//!   using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `sibyl` library.
//!
//! The settings shared by every command (project root, git base URL, fetch
//! timeout) are resolved once into [`Settings`].

pub mod completions;
pub mod install;
pub mod ls;
pub mod restore;
pub mod uninstall;
pub mod update;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};

use sibyl::git::CloneResult;
use sibyl::output::OutputConfig;
use sibyl::repository::{self, DefaultGitOperations, GitOperations};
use sibyl::suggestions;

/// Settings shared by all commands.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub git_base_url: String,
    pub timeout: Duration,
}

impl Settings {
    /// Resolve the project root and validate the git base URL.
    pub fn resolve(root: Option<PathBuf>, git_base_url: &str, timeout_secs: u64) -> Result<Self> {
        repository::validate_base_url(git_base_url)
            .map_err(|e| suggestions::invalid_git_base_url(git_base_url, &e))?;

        let root = match root {
            Some(root) => root,
            None => env::current_dir().context("Failed to determine the current directory")?,
        };

        Ok(Self {
            root,
            git_base_url: git_base_url.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The git collaborator for this run, with a spinner when the terminal
    /// allows it.
    pub fn git(&self, output: &OutputConfig) -> ProgressGit<DefaultGitOperations> {
        ProgressGit {
            inner: DefaultGitOperations::new(self.git_base_url.as_str()).with_timeout(self.timeout),
            enabled: output.show_progress(),
        }
    }
}

/// Shows a spinner on stderr while the wrapped collaborator fetches.
pub struct ProgressGit<G> {
    inner: G,
    enabled: bool,
}

impl<G> ProgressGit<G> {
    fn with_spinner<T>(&self, message: String, fetch: impl FnOnce() -> T) -> T {
        if !self.enabled {
            return fetch();
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        let result = fetch();
        spinner.finish_and_clear();
        result
    }
}

impl<G: GitOperations> GitOperations for ProgressGit<G> {
    fn clone_shallow(&self, org: &str, repo: &str, ref_name: &str) -> sibyl::error::Result<CloneResult> {
        self.with_spinner(format!("Fetching {}/{}@{}", org, repo, ref_name), || {
            self.inner.clone_shallow(org, repo, ref_name)
        })
    }

    fn clone_at_commit(&self, org: &str, repo: &str, commit: &str) -> sibyl::error::Result<CloneResult> {
        self.with_spinner(
            format!(
                "Fetching {}/{} at {}",
                org,
                repo,
                sibyl::output::short_commit(commit)
            ),
            || self.inner.clone_at_commit(org, repo, commit),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_explicit_root() {
        let settings =
            Settings::resolve(Some(PathBuf::from("/project")), "https://github.com", 30).unwrap();
        assert_eq!(settings.root, PathBuf::from("/project"));
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_rejects_invalid_base_url() {
        let err = Settings::resolve(None, "not a url", 60).unwrap_err();
        assert!(err.to_string().contains("Invalid git base URL"));
    }

    #[test]
    fn test_spinner_disabled_passes_through() {
        let git = ProgressGit {
            inner: (),
            enabled: false,
        };
        assert_eq!(git.with_spinner("msg".to_string(), || 7), 7);
    }
}
