//! # Fetching Package Sources
//!
//! The reconciler never runs git itself. It talks to a [`GitOperations`]
//! implementation that turns `(org, repo, ref)` or `(org, repo, commit)` into
//! a temporary working copy plus the commit it holds.
//!
//! In the application, [`DefaultGitOperations`] drives the system `git`
//! binary against `<base-url>/<org>/<repo>.git`. In tests, a recording mock
//! stands in for it so fetch counts and fallbacks can be asserted without
//! network access.

use std::time::Duration;

use crate::defaults::{DEFAULT_GIT_BASE_URL, FETCH_TIMEOUT};
use crate::error::Result;
use crate::git::{self, CloneResult};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Shallow-fetch the tip of `ref_name` (branch or tag).
    fn clone_shallow(&self, org: &str, repo: &str, ref_name: &str) -> Result<CloneResult>;

    /// Fetch exactly `commit`.
    fn clone_at_commit(&self, org: &str, repo: &str, commit: &str) -> Result<CloneResult>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real fetches.
#[derive(Debug, Clone)]
pub struct DefaultGitOperations {
    base_url: String,
    timeout: Duration,
}

impl DefaultGitOperations {
    /// Fetch from `base_url` with the default fetch timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: FETCH_TIMEOUT,
        }
    }

    /// Override the time budget for network fetches.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url_for(&self, org: &str, repo: &str) -> String {
        git::clone_url(&self.base_url, org, repo)
    }
}

/// Check that `base_url` is an absolute URL clone URLs can be built from.
pub fn validate_base_url(base_url: &str) -> Result<()> {
    url::Url::parse(base_url)?;
    Ok(())
}

impl Default for DefaultGitOperations {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_BASE_URL)
    }
}

impl GitOperations for DefaultGitOperations {
    fn clone_shallow(&self, org: &str, repo: &str, ref_name: &str) -> Result<CloneResult> {
        git::clone_shallow(&self.url_for(org, repo), ref_name, self.timeout)
    }

    fn clone_at_commit(&self, org: &str, repo: &str, commit: &str) -> Result<CloneResult> {
        git::clone_at_commit(&self.url_for(org, repo), commit, self.timeout)
    }
}
