//! # Build Command Implementation
//!
//! This module implements the `build` subcommand, which turns every module
//! under the source directory into a distributable script.
//!
//! ## Process
//!
//! 1.  **Configuration**: loads `.userscript-build.yaml` from the project root
//!     (defaults when absent).
//! 2.  **Discovery**: lists the modules, optionally narrowed with `--module`.
//! 3.  **Clean**: removes the build directory, or only the selected modules'
//!     directories.
//! 4.  **Assembly**: builds each module against the artifact committed at the
//!     branch tip (`--no-history` pretends there is none).
//! 5.  **Report**: prints a summary and fails when any module failed.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use userscript_build::assemble::{Assembler, BuildReport, ModuleStatus};
use userscript_build::config;
use userscript_build::defaults::PROJECT_CONFIG_FILE;
use userscript_build::git::GitHistory;
use userscript_build::output::format_report;

use crate::cli::CommandContext;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Only build the named module(s)
    #[arg(short, long = "module", value_name = "NAME")]
    pub modules: Vec<String>,

    /// Compute versions without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Ignore committed artifacts (every module gets a fresh version)
    #[arg(long)]
    pub no_history: bool,

    /// Summary format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

/// Execute the `build` command
pub fn execute(ctx: &CommandContext, args: BuildArgs) -> Result<()> {
    let config_path = ctx.root.join(PROJECT_CONFIG_FILE);
    let project = config::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let mut assembler = Assembler::new(&ctx.root, project).dry_run(args.dry_run);
    if !args.no_history {
        assembler = assembler.with_history(Box::new(GitHistory::new(&ctx.root)));
    }

    let mut modules = assembler.discover()?;
    if !args.modules.is_empty() {
        if let Some(unknown) = args
            .modules
            .iter()
            .find(|name| !modules.iter().any(|m| &m.name == *name))
        {
            anyhow::bail!(
                "Unknown module '{}' (not found in {})",
                unknown,
                assembler.paths().source_dir.display()
            );
        }
        modules.retain(|m| args.modules.contains(&m.name));
        assembler.clean(Some(&modules))?;
    } else {
        assembler.clean(None)?;
    }

    let report = assembler.build_all(&modules);
    print_report(&report, args.format)?;

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} module(s) failed to build",
            report.count(ModuleStatus::Failed),
            report.modules.len()
        );
    }
    Ok(())
}

fn print_report(report: &BuildReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => print!("{}", format_report(report)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}
