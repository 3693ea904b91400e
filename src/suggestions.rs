//! # Error Suggestions
//!
//! Helpers for CLI messages that tell users what went wrong AND how to fix
//! it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sibyl::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Invalid spec: {}", raw);
//!
//! // Use:
//! return Err(suggestions::invalid_spec(raw, package_type, &error));
//! ```

use crate::error::Error;
use crate::spec::PackageType;

/// Generate an error for a package spec that could not be parsed.
///
/// Includes the expected format and an example for the package type.
pub fn invalid_spec(raw: &str, package_type: PackageType, error: &Error) -> anyhow::Error {
    let example = match package_type {
        PackageType::Skill => "acme/tools/skills/lint-fix@main",
        PackageType::Agent => "acme/tools/agents/reviewer.md",
        PackageType::Command => "acme/tools/commands/deploy.md@v1.2.0",
    };

    anyhow::anyhow!(
        "Invalid {package_type} spec: {raw}\n\
         error: {error}\n\n\
         hint: Use <org>/<repo>/<path>[@<ref>], e.g. '{example}'\n\
         hint: The ref defaults to 'main' when '@<ref>' is omitted"
    )
}

/// Generate an error for an update filter that could not be parsed.
pub fn invalid_filter(raw: &str, error: &Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid update filter: {raw}\n\
         error: {error}\n\n\
         hint: Use <org>/<repo> to update every package from a repository\n\
         hint: Use <org>/<repo>/<path> to update a single package"
    )
}

/// Generate an error for an unusable `--git-base-url`.
pub fn invalid_git_base_url(raw: &str, error: &Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid git base URL: {raw}\n\
         error: {error}\n\n\
         hint: Use a URL such as 'https://github.com' or 'file:///srv/git'\n\
         hint: Set SIBYL_GIT_BASE_URL to change the default"
    )
}

/// Hint printed when `rm` finds nothing to remove.
///
/// Suggests a close installed name when there is one.
pub fn not_installed(package_type: PackageType, name: &str, installed: &[String]) -> String {
    let candidates: Vec<&str> = installed.iter().map(String::as_str).collect();
    match find_similar(name, &candidates) {
        Some(similar) => format!("No {package_type} named '{name}' is installed\nhint: Did you mean '{similar}'?"),
        None => format!(
            "No {package_type} named '{name}' is installed\n\
             hint: Run 'sibyl {package_type} ls' to see installed {dir}",
            dir = package_type.type_dir()
        ),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Single-row dynamic programming
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, a_char) in a_chars.iter().enumerate() {
        let mut current = vec![i + 1; b_chars.len() + 1];
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }

    previous[b_chars.len()]
}
