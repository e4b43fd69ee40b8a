//! # Hooks Command Implementation
//!
//! This module implements the `hooks` subcommand, which manages a Git
//! pre-commit hook that rebuilds the userscripts and stages the build
//! directory, so committed artifacts never lag behind their sources.
//!
//! ## Functionality
//!
//! - **Install**: appends a marked block to `.git/hooks/pre-commit`,
//!   creating the file when needed. Existing hook content is kept.
//! - **Uninstall**: removes the marked block, and the file when nothing else
//!   remains in it.
//! - **Status**: shows whether the block is present.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use userscript_build::config;
use userscript_build::defaults::PROJECT_CONFIG_FILE;
use userscript_build::git::find_git_dir;

use crate::cli::CommandContext;

/// Manage the userscript-build pre-commit hook
#[derive(Args, Debug)]
pub struct HooksArgs {
    #[command(subcommand)]
    pub command: HooksCommand,
}

#[derive(Subcommand, Debug)]
pub enum HooksCommand {
    /// Install the pre-commit hook
    Install(InstallArgs),

    /// Uninstall the pre-commit hook
    Uninstall,

    /// Show hook installation status
    Status,
}

/// Arguments for hook installation
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Replace an already installed block
    #[arg(long)]
    pub force: bool,
}

/// Execute the `hooks` command
pub fn execute(ctx: &CommandContext, args: HooksArgs) -> Result<()> {
    match args.command {
        HooksCommand::Install(install_args) => execute_install(&ctx.root, install_args),
        HooksCommand::Uninstall => execute_uninstall(&ctx.root),
        HooksCommand::Status => execute_status(&ctx.root),
    }
}

/// Line opening and closing the managed block
const HOOK_MARKER: &str = "# ==== userscript-build hook ====";

/// Generate the managed block of the pre-commit hook
fn generate_hook_block(build_dir: &Path) -> String {
    let build_dir = build_dir.display();
    format!(
        r#"{HOOK_MARKER}
# Rebuilds userscripts and stages the build output before each commit.
# To uninstall: userscript-build hooks uninstall
if command -v userscript-build >/dev/null 2>&1; then
    userscript-build build || exit 1
    git add "{build_dir}"
else
    echo "Warning: userscript-build not found in PATH, skipping build"
fi
{HOOK_MARKER}
"#
    )
}

/// Remove the managed block from hook content
fn strip_hook_block(content: &str) -> String {
    let mut out = Vec::new();
    let mut inside = false;
    for line in content.lines() {
        if line.trim() == HOOK_MARKER {
            inside = !inside;
            continue;
        }
        if !inside {
            out.push(line);
        }
    }
    let mut text = out.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Whether hook content has nothing left besides a shebang and blank lines
fn is_effectively_empty(content: &str) -> bool {
    content
        .lines()
        .all(|l| l.trim().is_empty() || l.starts_with("#!"))
}

fn hook_path(repo_path: &Path) -> Result<PathBuf> {
    Ok(find_git_dir(repo_path)?.join("hooks").join("pre-commit"))
}

fn build_dir(repo_path: &Path) -> Result<PathBuf> {
    let project = config::from_file(repo_path.join(PROJECT_CONFIG_FILE))?;
    Ok(project.build_dir)
}

/// Install the pre-commit hook
fn execute_install(repo_path: &Path, args: InstallArgs) -> Result<()> {
    let hook_path = hook_path(repo_path)?;
    if let Some(hooks_dir) = hook_path.parent() {
        fs::create_dir_all(hooks_dir)?;
    }

    let existing = if hook_path.exists() {
        fs::read_to_string(&hook_path)?
    } else {
        "#!/bin/sh\n".to_string()
    };

    let base = if existing.contains(HOOK_MARKER) {
        if !args.force {
            println!("userscript-build hook already installed. Use --force to reinstall.");
            return Ok(());
        }
        println!("Replacing existing userscript-build hook...");
        strip_hook_block(&existing)
    } else {
        existing
    };

    let mut content = base;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&generate_hook_block(&build_dir(repo_path)?));
    fs::write(&hook_path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&hook_path, perms)?;
    }

    println!("Installed pre-commit hook: {}", hook_path.display());
    println!("The hook will run 'userscript-build build' before each commit.");
    Ok(())
}

/// Uninstall the pre-commit hook
fn execute_uninstall(repo_path: &Path) -> Result<()> {
    let hook_path = hook_path(repo_path)?;

    if !hook_path.exists() {
        println!("No pre-commit hook found.");
        return Ok(());
    }

    let content = fs::read_to_string(&hook_path)?;
    if !content.contains(HOOK_MARKER) {
        println!("The pre-commit hook has no userscript-build block. Not modifying.");
        return Ok(());
    }

    let remaining = strip_hook_block(&content);
    if is_effectively_empty(&remaining) {
        fs::remove_file(&hook_path)?;
        println!("Removed pre-commit hook: {}", hook_path.display());
    } else {
        fs::write(&hook_path, remaining)?;
        println!(
            "Removed userscript-build block from: {}",
            hook_path.display()
        );
    }
    Ok(())
}

/// Show hook installation status
fn execute_status(repo_path: &Path) -> Result<()> {
    let hook_path = hook_path(repo_path)?;

    if !hook_path.exists() {
        println!("Status: Not installed");
        println!();
        println!("Run 'userscript-build hooks install' to install the pre-commit hook.");
        return Ok(());
    }

    let content = fs::read_to_string(&hook_path)?;
    if content.contains(HOOK_MARKER) {
        println!("Status: Installed");
    } else {
        println!("Status: Other hook present (no userscript-build block)");
    }
    println!("Hook path: {}", hook_path.display());
    Ok(())
}
