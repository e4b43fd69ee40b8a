//! CLI argument parsing and command dispatch

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use userscript_build::output::OutputConfig;

/// Userscript Build - Build userscripts with merged metadata and commit-aware versions
#[derive(Parser, Debug)]
#[command(name = "userscript-build")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Project root (defaults to current directory)
    #[arg(
        short = 'C',
        long,
        global = true,
        value_name = "DIR",
        env = "USERSCRIPT_BUILD_ROOT"
    )]
    root: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every module into the build directory
    Build(commands::build::BuildArgs),

    /// Manage the pre-commit hook that rebuilds before each commit
    Hooks(commands::hooks::HooksArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Shared settings handed to every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub root: PathBuf,
}

impl Cli {
    fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        // Ignore a second initialisation (tests may call execute repeatedly).
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .try_init();
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        let output = OutputConfig::from_env_and_flag(&self.color);
        output.apply();

        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        let ctx = CommandContext { root };

        match self.command {
            Commands::Build(args) => commands::build::execute(&ctx, args),
            Commands::Hooks(args) => commands::hooks::execute(&ctx, args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
