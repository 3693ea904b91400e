//! # Restore Command Implementation
//!
//! `sibyl i` rebuilds the store and `.claude/` links from `sibyl-lock.json`,
//! for example after a fresh clone of the project. Content already in the
//! store is linked without fetching. When a pinned commit can no longer be
//! fetched, the recorded ref is fetched instead and a warning says so.

use anyhow::Result;

use sibyl::output::{emoji, package_name, short_commit, OutputConfig};
use sibyl::reconcile::{self, Context, RestoreReport, RestoreSource};

use super::Settings;

/// Execute the restore command.
pub fn execute(settings: &Settings, output: &OutputConfig) -> Result<()> {
    let git = settings.git(output);
    let ctx = Context::new(&settings.root, &git);

    let packages = match reconcile::restore(&ctx)? {
        RestoreReport::EmptyLockfile => {
            println!("Nothing to restore: sibyl-lock.json has no packages.");
            return Ok(());
        }
        RestoreReport::Restored(packages) => packages,
    };

    let mut fetched = 0;
    for package in &packages {
        let entry = &package.entry;
        if package.source != RestoreSource::Store {
            fetched += 1;
        }
        println!(
            "{} {} {} ({})",
            emoji(output, "🔗", "[LINKED]"),
            entry.package_type,
            package_name(output, &entry.name),
            short_commit(&entry.commit)
        );

        if package.source.diverged(&entry.commit) {
            if let RestoreSource::Fallback {
                r#ref,
                fetched_commit,
            } = &package.source
            {
                eprintln!(
                    "{} {} could not be fetched at {}; restored from {} at {} instead",
                    emoji(output, "⚠️", "[WARN]"),
                    package.key,
                    short_commit(&entry.commit),
                    r#ref,
                    short_commit(fetched_commit)
                );
            }
        }
    }

    println!();
    println!(
        "{} package(s) restored, {} from fresh fetches",
        packages.len(),
        fetched
    );
    Ok(())
}
