//! # CLI Command Implementations
//!
//! Each subcommand of `userscript-build` lives in its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `userscript_build` library.

pub mod build;
pub mod completions;
pub mod hooks;
