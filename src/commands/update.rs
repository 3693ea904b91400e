//! # Update Command Implementation
//!
//! `sibyl update [FILTER]` and `sibyl <type> update [FILTER]` move installed
//! packages to the current tip of the ref recorded for them. Packages from the
//! same repository and ref share one fetch. The recorded ref never changes;
//! install with a different `@<ref>` to switch refs.
//!
//! The filter is either `<org>/<repo>` (every package from that repository)
//! or `<org>/<repo>/<path>` (one package).

use anyhow::Result;
use clap::Args;

use sibyl::error::Error;
use sibyl::output::{dim, emoji, package_name, short_commit, OutputConfig};
use sibyl::reconcile::{self, Context, Outcome, UpdateReport};
use sibyl::spec::PackageType;
use sibyl::suggestions;

use super::Settings;

/// Update installed packages
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Only update packages from <org>/<repo> or the package <org>/<repo>/<path>
    #[arg(value_name = "FILTER")]
    pub filter: Option<String>,
}

/// Execute the update command.
pub fn execute(
    package_type: Option<PackageType>,
    args: UpdateArgs,
    settings: &Settings,
    output: &OutputConfig,
) -> Result<()> {
    let git = settings.git(output);
    let ctx = Context::new(&settings.root, &git);

    let report = match reconcile::update(&ctx, package_type, args.filter.as_deref()) {
        Ok(report) => report,
        Err(e @ Error::Validation { .. }) => {
            return Err(suggestions::invalid_filter(
                args.filter.as_deref().unwrap_or_default(),
                &e,
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let results = match report {
        UpdateReport::EmptyLockfile => {
            println!("No packages installed.");
            return Ok(());
        }
        UpdateReport::NoMatches => {
            println!("No installed packages match.");
            return Ok(());
        }
        UpdateReport::Updated(results) => results,
    };

    let mut updated = 0;
    for result in &results {
        match result.outcome {
            Outcome::Applied => {
                updated += 1;
                println!(
                    "{} {} {} {} -> {}",
                    emoji(output, "⬆️", "[UPDATED]"),
                    result.entry.package_type,
                    package_name(output, &result.entry.name),
                    short_commit(result.previous_commit.as_deref().unwrap_or_default()),
                    short_commit(&result.entry.commit)
                );
            }
            _ => println!(
                "{} {} {} {}",
                emoji(output, "✔️", "[CURRENT]"),
                result.entry.package_type,
                package_name(output, &result.entry.name),
                dim(
                    output,
                    &format!(
                        "up to date at {}@{}",
                        result.entry.r#ref,
                        short_commit(&result.entry.commit)
                    )
                )
            ),
        }
    }

    println!();
    println!("{} updated, {} already current", updated, results.len() - updated);
    Ok(())
}
