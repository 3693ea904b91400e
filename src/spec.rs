//! # Package Specs
//!
//! A package is addressed by a spec string of the form
//! `<org>/<repo>/<path...>[@<ref>]`:
//!
//! - `org`: the organization or user owning the repository
//! - `repo`: the repository name
//! - `path`: the sub-tree inside the repository, which may itself contain `/`
//! - `ref`: an optional branch, tag or commit; defaults to `main`
//!
//! The ref is split off at the *last* `@`, so an `@` inside the path survives.
//! The version-independent identity of a package is its key, `org/repo/path`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_REF;
use crate::error::{Error, Result};

/// The kind of package, which decides where and how it is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Skill,
    Agent,
    Command,
}

impl PackageType {
    /// All package types, in display order.
    pub const ALL: [PackageType; 3] = [PackageType::Skill, PackageType::Agent, PackageType::Command];

    /// Directory under the consumption root that holds links of this type.
    pub fn type_dir(self) -> &'static str {
        match self {
            PackageType::Skill => "skills",
            PackageType::Agent => "agents",
            PackageType::Command => "commands",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageType::Skill => "skill",
            PackageType::Agent => "agent",
            PackageType::Command => "command",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "skill" => Ok(PackageType::Skill),
            "agent" => Ok(PackageType::Agent),
            "command" => Ok(PackageType::Command),
            other => Err(format!("unknown package type '{}'", other)),
        }
    }
}

/// A parsed package spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub org: String,
    pub repo: String,
    pub path: String,
    pub r#ref: String,
}

impl PackageSpec {
    /// Parse a spec string like `acme/tools/skills/lint-fix@v1`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(invalid(raw, "spec must not be empty"));
        }

        let (body, r#ref) = match raw.rfind('@') {
            Some(at) if at > 0 => {
                let r#ref = &raw[at + 1..];
                let r#ref = if r#ref.is_empty() { DEFAULT_REF } else { r#ref };
                (&raw[..at], r#ref)
            }
            _ => (raw, DEFAULT_REF),
        };

        let mut parts = body.splitn(3, '/');
        let (org, repo, path) = match (parts.next(), parts.next(), parts.next()) {
            (Some(org), Some(repo), Some(path)) => (org, repo, path),
            _ => {
                return Err(invalid(
                    raw,
                    "expected <org>/<repo>/<path> (at least 3 segments)",
                ))
            }
        };

        if org.is_empty() || repo.is_empty() || path.is_empty() {
            return Err(invalid(raw, "org, repo, and path are required"));
        }
        check_segment(raw, "org", org)?;
        check_segment(raw, "repo", repo)?;
        check_relative_path(raw, "path", path)?;
        check_ref(raw, r#ref)?;

        let spec = Self {
            org: org.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            r#ref: r#ref.to_string(),
        };
        check_segment(raw, "name", &spec.name())?;
        Ok(spec)
    }

    /// Short name: the last path segment with one trailing `.md` removed.
    ///
    /// `acme/tools/agents/my-agent.md` yields `my-agent`.
    pub fn name(&self) -> String {
        let last = self.path.rsplit('/').next().unwrap_or(&self.path);
        last.strip_suffix(".md").unwrap_or(last).to_string()
    }

    /// Lockfile key: `org/repo/path`.
    pub fn key(&self) -> String {
        package_key(&self.org, &self.repo, &self.path)
    }
}

impl FromStr for PackageSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}@{}", self.org, self.repo, self.path, self.r#ref)
    }
}

/// Build the key a package is stored under in the lockfile.
pub fn package_key(org: &str, repo: &str, path: &str) -> String {
    format!("{}/{}/{}", org, repo, path)
}

/// Check a single path component: non-empty, not `.` or `..`, and free of
/// path separators.
pub fn check_segment(input: &str, field: &str, segment: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains(['/', '\\']) {
        return Err(invalid(
            input,
            &format!("{} '{}' is not a plain path segment", field, segment),
        ));
    }
    Ok(())
}

/// Check a relative `/`-separated path made only of plain segments.
///
/// Rejects absolute paths, trailing slashes, and `.` or `..` components.
pub fn check_relative_path(input: &str, field: &str, path: &str) -> Result<()> {
    if path.is_empty() || path.split('/').any(|segment| check_segment(input, field, segment).is_err()) {
        return Err(invalid(
            input,
            &format!(
                "{} '{}' must be relative, with no empty, '.' or '..' segments",
                field, path
            ),
        ));
    }
    Ok(())
}

/// Check a ref can be passed to git as a value and never read as an option.
pub fn check_ref(input: &str, r#ref: &str) -> Result<()> {
    if r#ref.is_empty() || r#ref.starts_with('-') || r#ref.chars().any(char::is_whitespace) {
        return Err(invalid(input, &format!("ref '{}' is not a valid git ref", r#ref)));
    }
    Ok(())
}

fn invalid(raw: &str, message: &str) -> Error {
    Error::Validation {
        input: raw.to_string(),
        message: message.to_string(),
    }
}
