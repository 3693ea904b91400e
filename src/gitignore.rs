//! # Managed `.gitignore` Sections
//!
//! Every directory sibyl links into carries a `.gitignore` with at most one
//! tool-managed section, opened by [`GITIGNORE_HEADER`]:
//!
//! ```text
//! *.local
//!
//! # managed by sibyl
//! lint-fix
//! review.md
//! ```
//!
//! Everything outside the section is user content and is preserved verbatim.
//! The section ends at a blank line, a new comment line, or end of file.
//! Entries are rendered sorted so the output does not depend on the order in
//! which packages were linked.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults::GITIGNORE_HEADER;
use crate::error::{Error, Result};

/// File name of the ignore file inside a managed directory.
pub const GITIGNORE_FILE: &str = ".gitignore";

/// A `.gitignore` split into user lines and the managed entry set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreFile {
    user: Vec<String>,
    managed: BTreeSet<String>,
}

impl IgnoreFile {
    /// Split existing content into user content and managed entries.
    pub fn parse(content: &str) -> Self {
        let mut user = Vec::new();
        let mut managed = BTreeSet::new();
        let mut in_section = false;

        for line in content.split('\n') {
            let trimmed = line.trim();
            if trimmed == GITIGNORE_HEADER {
                in_section = true;
                continue;
            }
            if in_section {
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    // The terminating line belongs to the user
                    in_section = false;
                    user.push(line.to_string());
                } else {
                    managed.insert(trimmed.to_string());
                }
                continue;
            }
            user.push(line.to_string());
        }

        while user.last().is_some_and(|l| l.trim().is_empty()) {
            user.pop();
        }

        Self { user, managed }
    }

    /// Entries currently listed in the managed section.
    pub fn managed(&self) -> &BTreeSet<String> {
        &self.managed
    }

    /// Lines outside the managed section, trailing blank lines removed.
    pub fn user_lines(&self) -> &[String] {
        &self.user
    }

    /// Returns true if a user-authored line (outside the managed section)
    /// matches any of `patterns` after trimming.
    pub fn user_ignores(&self, patterns: &[&str]) -> bool {
        self.user
            .iter()
            .any(|line| patterns.contains(&line.trim()))
    }

    /// Add entries to the managed set. Returns true if the set changed.
    pub fn add<I, S>(&mut self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = false;
        for name in names {
            changed |= self.managed.insert(name.as_ref().to_string());
        }
        changed
    }

    /// Remove entries from the managed set. Returns true if the set changed.
    pub fn remove<I, S>(&mut self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = false;
        for name in names {
            changed |= self.managed.remove(name.as_ref());
        }
        changed
    }

    /// Render the file. `None` means nothing is left and the file should be
    /// deleted.
    pub fn render(&self) -> Option<String> {
        if self.managed.is_empty() {
            if self.user.is_empty() {
                return None;
            }
            return Some(format!("{}\n", self.user.join("\n")));
        }

        let mut out = String::new();
        if !self.user.is_empty() {
            out.push_str(&self.user.join("\n"));
            out.push_str("\n\n");
        }
        out.push_str(GITIGNORE_HEADER);
        out.push('\n');
        for entry in &self.managed {
            out.push_str(entry);
            out.push('\n');
        }
        Some(out)
    }
}

/// Path of the ignore file inside `dir`.
pub fn gitignore_path(dir: &Path) -> PathBuf {
    dir.join(GITIGNORE_FILE)
}

/// Read and parse the ignore file in `dir`; a missing file parses as empty.
pub fn read(dir: &Path) -> Result<IgnoreFile> {
    let path = gitignore_path(dir);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(IgnoreFile::parse(&content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(IgnoreFile::default()),
        Err(e) => Err(link_error(&path, "Failed to read ignore file", e)),
    }
}

/// Write `file` back to `dir`, deleting the ignore file when nothing is left.
pub fn write(dir: &Path, file: &IgnoreFile) -> Result<()> {
    let path = gitignore_path(dir);
    match file.render() {
        Some(content) => {
            fs::write(&path, content).map_err(|e| link_error(&path, "Failed to write ignore file", e))
        }
        None => match fs::remove_file(&path) {
            Ok(()) => {
                debug!("removed empty {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(link_error(&path, "Failed to remove ignore file", e)),
        },
    }
}

/// Register `names` in the managed section of `dir/.gitignore`.
pub fn add_entries<S: AsRef<str>>(dir: &Path, names: &[S]) -> Result<()> {
    let mut file = read(dir)?;
    if file.add(names) {
        write(dir, &file)?;
    }
    Ok(())
}

/// Deregister `names` from the managed section of `dir/.gitignore`.
pub fn remove_entries<S: AsRef<str>>(dir: &Path, names: &[S]) -> Result<()> {
    let mut file = read(dir)?;
    if file.remove(names) {
        write(dir, &file)?;
    }
    Ok(())
}

/// Make sure `entry` is ignored in `dir/.gitignore`.
///
/// A user line matching `entry` or one of `aliases` already satisfies this;
/// otherwise `entry` is kept in the managed section.
pub fn ensure_ignored(dir: &Path, entry: &str, aliases: &[&str]) -> Result<()> {
    let mut file = read(dir)?;
    let mut patterns = vec![entry];
    patterns.extend_from_slice(aliases);
    if file.user_ignores(&patterns) {
        return Ok(());
    }
    if file.add([entry]) {
        write(dir, &file)?;
    }
    Ok(())
}

fn link_error(path: &Path, what: &str, e: io::Error) -> Error {
    Error::Link {
        path: path.to_path_buf(),
        message: format!("{}: {}", what, e),
    }
}
