//! Recording git collaborator for reconciler tests.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::git::CloneResult;
use crate::repository::GitOperations;

/// One call made against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Shallow {
        org: String,
        repo: String,
        r#ref: String,
    },
    AtCommit {
        org: String,
        repo: String,
        commit: String,
    },
}

type Files = Vec<(String, String)>;

/// Serves canned repository snapshots and records every fetch.
pub struct MockGitOperations {
    pub calls: Arc<Mutex<Vec<GitCall>>>,
    tips: Mutex<HashMap<(String, String, String), String>>,
    snapshots: Mutex<HashMap<(String, String, String), Files>>,
    serve_commits: Mutex<bool>,
}

impl MockGitOperations {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            tips: Mutex::new(HashMap::new()),
            snapshots: Mutex::new(HashMap::new()),
            serve_commits: Mutex::new(true),
        }
    }

    /// Point `org/repo@ref` at `commit`, whose tree holds `files`.
    pub fn publish(&self, org: &str, repo: &str, r#ref: &str, commit: &str, files: &[(&str, &str)]) {
        self.tips.lock().unwrap().insert(
            (org.to_string(), repo.to_string(), r#ref.to_string()),
            commit.to_string(),
        );
        self.snapshots.lock().unwrap().insert(
            (org.to_string(), repo.to_string(), commit.to_string()),
            files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
        );
    }

    /// Make every fetch by commit fail, as a server that only serves refs would.
    pub fn refuse_commit_fetches(&self) {
        *self.serve_commits.lock().unwrap() = false;
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn shallow_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GitCall::Shallow { .. }))
            .count()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn checkout(&self, org: &str, repo: &str, commit: &str) -> Result<CloneResult> {
        let snapshots = self.snapshots.lock().unwrap();
        let files = snapshots
            .get(&(org.to_string(), repo.to_string(), commit.to_string()))
            .ok_or_else(|| clone_error(org, repo, commit, "fatal: not our ref"))?;

        let dir = TempDir::new()?;
        for (path, content) in files {
            let dest = dir.path().join(path);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(dest, content)?;
        }
        Ok(CloneResult {
            dir,
            commit: commit.to_string(),
        })
    }
}

fn clone_error(org: &str, repo: &str, r#ref: &str, message: &str) -> Error {
    Error::GitClone {
        url: format!("mock://{}/{}", org, repo),
        r#ref: r#ref.to_string(),
        message: message.to_string(),
        hint: None,
    }
}

impl GitOperations for MockGitOperations {
    fn clone_shallow(&self, org: &str, repo: &str, ref_name: &str) -> Result<CloneResult> {
        self.calls.lock().unwrap().push(GitCall::Shallow {
            org: org.to_string(),
            repo: repo.to_string(),
            r#ref: ref_name.to_string(),
        });
        let commit = self
            .tips
            .lock()
            .unwrap()
            .get(&(org.to_string(), repo.to_string(), ref_name.to_string()))
            .cloned()
            .ok_or_else(|| {
                clone_error(org, repo, ref_name, "Remote branch not found in upstream origin")
            })?;
        self.checkout(org, repo, &commit)
    }

    fn clone_at_commit(&self, org: &str, repo: &str, commit: &str) -> Result<CloneResult> {
        self.calls.lock().unwrap().push(GitCall::AtCommit {
            org: org.to_string(),
            repo: repo.to_string(),
            commit: commit.to_string(),
        });
        if !*self.serve_commits.lock().unwrap() {
            return Err(clone_error(org, repo, commit, "fatal: not our ref"));
        }
        self.checkout(org, repo, commit)
    }
}
