//! # Error Handling
//!
//! This module defines the centralized error type for `userscript-build`. It
//! uses `thiserror` to describe every failure the library can report, with
//! enough context (module name, line number, command) for the CLI to print a
//! useful message without further decoration.
//!
//! Errors fall into two families:
//!
//! - **Configuration errors**: a module without a manifest, a malformed
//!   manifest, zero or several entry scripts, an invalid dependency URL. These
//!   abort the build of that one module.
//! - **Runtime errors**: git or transpiler invocation failures, I/O, a
//!   malformed metadata line, version generation that could not make progress.
//!
//! The `Result` alias is used throughout the library.

use thiserror::Error;

/// Main error type for userscript-build operations
#[derive(Error, Debug)]
pub enum Error {
    /// The project configuration file could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A module's manifest is missing, unreadable or invalid.
    #[error("[{module}] Module configuration error: {message}")]
    ModuleConfig { module: String, message: String },

    /// No file in the module directory looks like an entry script.
    #[error("[{module}] No entry script found (expected a .js or .ts file named like 'index' or 'main')")]
    MissingEntryScript { module: String },

    /// More than one file in the module directory looks like an entry script.
    #[error("[{module}] Multiple entry scripts found: {}", files.join(", "))]
    AmbiguousEntryScript { module: String, files: Vec<String> },

    /// A key line inside the metadata block has no separating space.
    #[error("Metadata parse error at line {line}: {message}")]
    MetadataParse { line: usize, message: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// The transpiler could not be started.
    #[error("Transpiler error for {input}: {message}")]
    Transpile { input: String, message: String },

    /// A fresh version string distinct from the previous one could not be
    /// produced.
    #[error("Version generation error: {message}")]
    Version { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether this error belongs to the configuration family.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::ConfigParse { .. }
                | Error::ModuleConfig { .. }
                | Error::MissingEntryScript { .. }
                | Error::AmbiguousEntryScript { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
