//! Git plumbing used to fetch package sources.
//!
//! This uses the system `git` command, which automatically handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig
//!
//! Every fetch lands in a fresh temporary directory owned by the returned
//! [`CloneResult`]; dropping it deletes the working copy. Every git command
//! runs under a time budget and is killed when it overruns.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use tempfile::TempDir;
use wait_timeout::ChildExt;

use crate::defaults::LOCAL_GIT_TIMEOUT;
use crate::error::{Error, Result};
use crate::spec::check_ref;

/// A fetched working copy and the commit it is checked out at.
#[derive(Debug)]
pub struct CloneResult {
    /// Working copy; removed from disk when dropped.
    pub dir: TempDir,
    /// Full SHA of the checked-out commit.
    pub commit: String,
}

impl CloneResult {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Build the clone URL for `org/repo` under `base_url`.
pub fn clone_url(base_url: &str, org: &str, repo: &str) -> String {
    format!("{}/{}/{}.git", base_url.trim_end_matches('/'), org, repo)
}

/// Shallow-clone `url` at `ref_name` (branch or tag) into a temporary
/// directory.
pub fn clone_shallow(url: &str, ref_name: &str, timeout: Duration) -> Result<CloneResult> {
    check_ref(ref_name, ref_name)?;
    let dir = working_dir()?;
    let target = dir.path().to_string_lossy().to_string();
    info!("cloning {}@{}", url, ref_name);

    run_git(
        &[
            "clone",
            "--quiet",
            "--depth",
            "1",
            "--single-branch",
            "--branch",
            ref_name,
            "--",
            url,
            &target,
        ],
        url,
        timeout,
    )
    .map_err(|e| clone_error(e, url, ref_name))?;

    let commit = resolve_commit(dir.path(), url)?;
    debug!("{}@{} resolved to {}", url, ref_name, commit);
    Ok(CloneResult { dir, commit })
}

/// Fetch exactly `commit` from `url` into a temporary directory.
///
/// A shallow clone cannot name a commit, so this initializes an empty
/// repository, fetches the single commit and checks it out. Servers that do
/// not allow fetching unadvertised commits make this fail.
pub fn clone_at_commit(url: &str, commit: &str, timeout: Duration) -> Result<CloneResult> {
    check_commit_id(commit)?;
    let dir = working_dir()?;
    let target = dir.path().to_string_lossy().to_string();
    info!("fetching {} at {}", url, commit);

    run_git(&["init", "--quiet", "--", &target], url, LOCAL_GIT_TIMEOUT)?;
    run_git(
        &["-C", &target, "remote", "add", "--", "origin", url],
        url,
        LOCAL_GIT_TIMEOUT,
    )?;
    run_git(
        &["-C", &target, "fetch", "--quiet", "--depth", "1", "--", "origin", commit],
        url,
        timeout,
    )
    .map_err(|e| clone_error(e, url, commit))?;
    run_git(
        &[
            "-C",
            &target,
            "-c",
            "advice.detachedHead=false",
            "checkout",
            "--quiet",
            "FETCH_HEAD",
        ],
        url,
        LOCAL_GIT_TIMEOUT,
    )?;

    let commit = resolve_commit(dir.path(), url)?;
    Ok(CloneResult { dir, commit })
}

/// Read the HEAD commit of a working copy.
pub fn resolve_commit(repo_dir: &Path, url: &str) -> Result<String> {
    let target = repo_dir.to_string_lossy().to_string();
    let stdout = run_git(&["-C", &target, "rev-parse", "HEAD"], url, LOCAL_GIT_TIMEOUT)?;
    Ok(stdout.trim().to_string())
}

/// Check that `commit` is an abbreviated or full hexadecimal object id.
pub fn check_commit_id(commit: &str) -> Result<()> {
    let valid = (7..=64).contains(&commit.len()) && commit.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(Error::Validation {
            input: commit.to_string(),
            message: "commit must be 7 to 64 hexadecimal characters".to_string(),
        });
    }
    Ok(())
}

fn working_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("sibyl-clone-").tempdir()?)
}

/// Run `git <args>` and return its stdout.
fn run_git(args: &[&str], url: &str, timeout: Duration) -> Result<String> {
    let command = args.join(" ");
    let mut child = Command::new("git")
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::GitCommand {
            command: command.clone(),
            url: url.to_string(),
            stderr: format!("failed to run git: {}", e),
        })?;

    // Drain both pipes concurrently so a chatty command cannot block on a full pipe
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || read_pipe(stdout));
    let stderr_reader = thread::spawn(move || read_pipe(stderr));

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::GitTimeout {
                command,
                url: url.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(Error::GitCommand {
            command,
            url: url.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(stdout)
}

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let mut out = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut out);
    }
    out
}

/// Turn a failed clone/fetch command into a `GitClone` error with a hint for
/// the common failure modes. Timeouts pass through unchanged.
fn clone_error(error: Error, url: &str, ref_name: &str) -> Error {
    match error {
        Error::GitCommand { stderr, .. } => {
            let hint = clone_hint(&stderr);
            Error::GitClone {
                url: url.to_string(),
                r#ref: ref_name.to_string(),
                message: stderr,
                hint,
            }
        }
        other => other,
    }
}

fn clone_hint(stderr: &str) -> Option<String> {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
        || stderr.contains("terminal prompts disabled")
    {
        Some(
            "Make sure you have access to the repository (SSH key in ssh-agent, \
             git credentials, or a personal access token)"
                .to_string(),
        )
    } else if stderr.contains("Remote branch") && stderr.contains("not found") {
        Some("Check that the branch or tag after '@' exists in the repository".to_string())
    } else if stderr.contains("not our ref") || stderr.contains("couldn't find remote ref") {
        Some("The server does not serve this commit directly".to_string())
    } else {
        None
    }
}
