//! # Uninstall Command Implementation
//!
//! `sibyl <type> rm <NAME>` removes the package's links, its store content
//! and its lockfile entry. Removing a name that is not installed is not an
//! error; a hint is printed instead.

use anyhow::Result;
use clap::Args;

use sibyl::output::{emoji, package_name, OutputConfig};
use sibyl::reconcile::{self, Context, Outcome};
use sibyl::spec::PackageType;
use sibyl::suggestions;

use super::Settings;

/// Remove an installed package
#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Package name as shown by `ls` (e.g. lint-fix)
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Execute the uninstall command.
pub fn execute(
    package_type: PackageType,
    args: UninstallArgs,
    settings: &Settings,
    output: &OutputConfig,
) -> Result<()> {
    let git = settings.git(output);
    let ctx = Context::new(&settings.root, &git);

    let report = reconcile::uninstall(&ctx, package_type, &args.name)?;
    if report.outcome == Outcome::NotFound {
        let installed: Vec<String> = reconcile::list(&ctx, Some(package_type))?
            .into_iter()
            .map(|(_, entry)| entry.name)
            .collect();
        println!("{}", suggestions::not_installed(package_type, &args.name, &installed));
        return Ok(());
    }

    for (key, entry) in &report.removed {
        println!(
            "{} Removed {} {} ({})",
            emoji(output, "🗑️", "[REMOVED]"),
            package_type,
            package_name(output, &entry.name),
            key
        );
    }
    Ok(())
}
