//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use sibyl::defaults::DEFAULT_GIT_BASE_URL;
use sibyl::output::OutputConfig;
use sibyl::spec::PackageType;

use crate::commands::{self, Settings};

/// Sibyl - Install skills, agents and commands pinned from git repositories
#[derive(Parser, Debug)]
#[command(name = "sibyl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Project root holding sibyl-lock.json (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR", env = "SIBYL_ROOT")]
    root: Option<PathBuf>,

    /// Base URL repositories are cloned from, as <base>/<org>/<repo>.git
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "SIBYL_GIT_BASE_URL",
        default_value = DEFAULT_GIT_BASE_URL
    )]
    git_base_url: String,

    /// Seconds a clone or fetch may take before it is aborted
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        env = "SIBYL_GIT_TIMEOUT",
        default_value_t = 60
    )]
    timeout: u64,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Restore every package recorded in sibyl-lock.json
    #[command(name = "i", visible_alias = "restore")]
    Restore,

    /// Update installed packages of every type to the tip of their ref
    Update(commands::update::UpdateArgs),

    /// List installed packages of every type
    Ls,

    /// Manage skills (.claude/skills)
    Skill(PackageArgs),

    /// Manage agents (.claude/agents)
    Agent(PackageArgs),

    /// Manage commands (.claude/commands)
    #[command(name = "command")]
    SlashCommand(PackageArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

#[derive(Args, Debug)]
struct PackageArgs {
    #[command(subcommand)]
    action: PackageAction,
}

#[derive(Subcommand, Debug)]
enum PackageAction {
    /// Install a package from <org>/<repo>/<path>[@<ref>]
    #[command(name = "i", visible_alias = "install")]
    Install(commands::install::InstallArgs),

    /// List installed packages of this type
    Ls,

    /// Remove an installed package by name
    #[command(name = "rm", visible_alias = "uninstall")]
    Remove(commands::uninstall::UninstallArgs),

    /// Update installed packages of this type
    Update(commands::update::UpdateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        let settings = || Settings::resolve(self.root.clone(), &self.git_base_url, self.timeout);

        match self.command {
            Commands::Completions(args) => commands::completions::execute(args),
            Commands::Restore => commands::restore::execute(&settings()?, &output),
            Commands::Update(args) => commands::update::execute(None, args, &settings()?, &output),
            Commands::Ls => commands::ls::execute(None, &settings()?, &output),
            Commands::Skill(args) => execute_package(PackageType::Skill, args, &settings()?, &output),
            Commands::Agent(args) => execute_package(PackageType::Agent, args, &settings()?, &output),
            Commands::SlashCommand(args) => {
                execute_package(PackageType::Command, args, &settings()?, &output)
            }
        }
    }
}

fn execute_package(
    package_type: PackageType,
    args: PackageArgs,
    settings: &Settings,
    output: &OutputConfig,
) -> Result<()> {
    match args.action {
        PackageAction::Install(install) => {
            commands::install::execute(package_type, install, settings, output)
        }
        PackageAction::Ls => commands::ls::execute(Some(package_type), settings, output),
        PackageAction::Remove(remove) => {
            commands::uninstall::execute(package_type, remove, settings, output)
        }
        PackageAction::Update(update) => {
            commands::update::execute(Some(package_type), update, settings, output)
        }
    }
}

/// Install the stderr logger. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
