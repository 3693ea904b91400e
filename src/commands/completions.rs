//! # Completions Command Implementation
//!
//! `sibyl completions <shell>` prints a completion script built from the
//! clap definition in [`crate::cli`], so `sibyl i`, `sibyl update`, the
//! `skill`/`agent`/`command` subcommands and their `i`/`ls`/`rm`/`update`
//! actions all tab-complete, along with global flags like `--git-base-url`.
//!
//! ```bash
//! sibyl completions bash > ~/.local/share/bash-completion/completions/sibyl
//! sibyl completions zsh > ~/.zfunc/_sibyl
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

const BIN_NAME: &str = "sibyl";

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout().lock());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
}
