//! # Userscript Build CLI
//!
//! Binary entry point for `userscript-build`. It parses arguments with
//! `clap`, sets up logging and output, and dispatches to a subcommand. All
//! build logic lives in the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
