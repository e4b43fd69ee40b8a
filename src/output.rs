//! # Output Configuration
//!
//! Colour handling and the human-readable build summary.
//!
//! Colour is decided once from the `--color` flag and the environment:
//! - `--color=always|never` wins outright
//! - `NO_COLOR` (any value) disables colour
//! - `CLICOLOR=0` disables colour, `CLICOLOR_FORCE=1` forces it
//! - `TERM=dumb` disables colour
//! - otherwise colour follows whether stdout is a capable terminal

use console::style;
use std::env;

use crate::assemble::{BuildReport, ModuleReport, ModuleStatus};

/// Output configuration for controlling colours.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and the `--color`
    /// value (`always`, `never` or `auto`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    /// Apply this configuration to the `console` crate's global switches.
    pub fn apply(&self) {
        console::set_colors_enabled(self.use_color);
        console::set_colors_enabled_stderr(self.use_color);
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

fn status_label(status: ModuleStatus) -> String {
    match status {
        ModuleStatus::Updated => style("updated").green().to_string(),
        ModuleStatus::Unchanged => style("unchanged").dim().to_string(),
        ModuleStatus::Failed => style("FAILED").red().bold().to_string(),
    }
}

/// One summary line for a module.
pub fn format_module(line: &ModuleReport) -> String {
    let label = status_label(line.status);
    match line.status {
        ModuleStatus::Updated => format!(
            "{:<10} {}  {} -> {}",
            label,
            line.module,
            line.previous_version.as_deref().unwrap_or("none"),
            line.version.as_deref().unwrap_or("")
        ),
        ModuleStatus::Unchanged => format!(
            "{:<10} {}  {}",
            label,
            line.module,
            line.version.as_deref().unwrap_or("")
        ),
        ModuleStatus::Failed => format!(
            "{:<10} {}  {}",
            label,
            line.module,
            line.error.as_deref().unwrap_or("")
        ),
    }
}

/// Full text summary of a build.
pub fn format_report(report: &BuildReport) -> String {
    let mut out = String::new();
    for line in &report.modules {
        out.push_str(&format_module(line));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} module(s): {} updated, {} unchanged, {} failed\n",
        report.modules.len(),
        report.count(ModuleStatus::Updated),
        report.count(ModuleStatus::Unchanged),
        report.count(ModuleStatus::Failed)
    ));
    out
}
