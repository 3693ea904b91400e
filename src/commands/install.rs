//! # Install Command Implementation
//!
//! `sibyl <type> i <SPEC>` fetches the tip of the spec's ref, places the
//! package in the store under the fetched commit, links it into
//! `.claude/<type>/` and records it in `sibyl-lock.json`. Installing a
//! package that is already pinned from the same ref does nothing.

use anyhow::Result;
use clap::Args;

use sibyl::error::Error;
use sibyl::output::{emoji, package_name, short_commit, OutputConfig};
use sibyl::reconcile::{self, Context, Outcome};
use sibyl::spec::PackageType;
use sibyl::suggestions;

use super::Settings;

/// Install a package
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Package spec: <org>/<repo>/<path>[@<ref>]
    #[arg(value_name = "SPEC")]
    pub spec: String,
}

/// Execute the install command.
pub fn execute(
    package_type: PackageType,
    args: InstallArgs,
    settings: &Settings,
    output: &OutputConfig,
) -> Result<()> {
    let git = settings.git(output);
    let ctx = Context::new(&settings.root, &git);

    let result = match reconcile::install(&ctx, package_type, &args.spec) {
        Ok(result) => result,
        Err(e @ Error::Validation { .. }) => {
            return Err(suggestions::invalid_spec(&args.spec, package_type, &e))
        }
        Err(e) => return Err(e.into()),
    };

    match result.outcome {
        Outcome::AlreadyCurrent => println!(
            "{} {} {} is already installed from {} ({})",
            emoji(output, "✔️", "[OK]"),
            package_type,
            package_name(output, &result.entry.name),
            result.entry.r#ref,
            short_commit(&result.entry.commit)
        ),
        _ => {
            println!(
                "{} Installed {} {} from {}@{} ({})",
                emoji(output, "✅", "[OK]"),
                package_type,
                package_name(output, &result.entry.name),
                result.key,
                result.entry.r#ref,
                short_commit(&result.entry.commit)
            );
            for link in &result.links {
                println!("   .claude/{}/{}", package_type.type_dir(), link);
            }
        }
    }
    Ok(())
}
