//! # Ls Command Implementation
//!
//! Lists installed packages from `sibyl-lock.json`, optionally for one type.
//! This command is read-only and never touches the network.

use anyhow::Result;

use sibyl::output::{entry_line, OutputConfig};
use sibyl::reconcile::{self, Context};
use sibyl::repository::DefaultGitOperations;
use sibyl::spec::PackageType;

use super::Settings;

/// Execute the ls command.
pub fn execute(
    package_type: Option<PackageType>,
    settings: &Settings,
    output: &OutputConfig,
) -> Result<()> {
    // Listing never fetches; any collaborator will do
    let git = DefaultGitOperations::new(settings.git_base_url.as_str());
    let ctx = Context::new(&settings.root, &git);
    let entries = reconcile::list(&ctx, package_type)?;

    if entries.is_empty() {
        match package_type {
            Some(t) => println!("No {} installed.", t.type_dir()),
            None => println!("No packages installed."),
        }
        return Ok(());
    }

    for (_, entry) in &entries {
        println!("{}", entry_line(output, entry));
    }
    Ok(())
}
