//! # Build History
//!
//! The previous artifact of a module is the version committed at the tip of
//! the current branch. [`History`] abstracts that lookup so the assembler can
//! be exercised without a repository; [`GitHistory`] shells out to the system
//! `git` command.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Trait for reading committed files - allows substituting history in tests
pub trait History {
    /// Content of `path` (relative to the project root, `/`-separated) at
    /// the branch tip, or `None` when the file is not committed.
    fn previous_file(&self, path: &str) -> Result<Option<String>>;
}

/// History backed by the `git` command, rooted at a project directory.
#[derive(Debug, Clone)]
pub struct GitHistory {
    root: PathBuf,
}

impl GitHistory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl History for GitHistory {
    fn previous_file(&self, path: &str) -> Result<Option<String>> {
        show_file(&self.root, "HEAD", path)
    }
}

/// History that has never seen a commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl History for NoHistory {
    fn previous_file(&self, _path: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Run `git <args>` in `root` and capture its output.
fn git_output(root: &Path, args: &[&str]) -> Result<Output> {
    log::debug!("Running git {}", args.join(" "));
    Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            stderr: e.to_string(),
        })
}

fn command_error(args: &[&str], output: &Output) -> Error {
    Error::GitCommand {
        command: args.join(" "),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Read `path` at `rev` with `git show`, run from `root`.
///
/// The path is resolved relative to `root`, so `root` may be a
/// sub-directory of the work tree. Absence is decided from exit statuses,
/// never from git's messages:
///
/// - `rev-parse --verify -q` exits 1 when `rev` does not name a commit
///   (e.g. a repository without commits) and 128 outside a repository.
/// - once the commit is known, `cat-file -e` fails only when `path` is not
///   in its tree.
pub fn show_file(root: &Path, rev: &str, path: &str) -> Result<Option<String>> {
    let commit = format!("{}^{{commit}}", rev);
    let verify = ["rev-parse", "--verify", "-q", commit.as_str()];
    let output = git_output(root, &verify)?;
    if !output.status.success() {
        if output.status.code() == Some(1) {
            log::debug!("{} does not name a commit", rev);
            return Ok(None);
        }
        return Err(command_error(&verify, &output));
    }

    let spec = format!("{}:./{}", rev, path);
    let exists = ["cat-file", "-e", spec.as_str()];
    if !git_output(root, &exists)?.status.success() {
        log::debug!("{} not found in {}", path, rev);
        return Ok(None);
    }

    let show = ["show", spec.as_str()];
    let output = git_output(root, &show)?;
    if !output.status.success() {
        return Err(command_error(&show, &output));
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

/// Locate the `.git` directory of the repository at `repo_path`.
///
/// Handles worktrees and submodules where `.git` is a file pointing at the
/// real directory.
pub fn find_git_dir(repo_path: &Path) -> Result<PathBuf> {
    let git_dir = repo_path.join(".git");

    if git_dir.is_dir() {
        Ok(git_dir)
    } else if git_dir.is_file() {
        let content = std::fs::read_to_string(&git_dir)?;
        let gitdir = content
            .strip_prefix("gitdir: ")
            .ok_or_else(|| Error::GitCommand {
                command: "read .git".to_string(),
                stderr: "Invalid .git file format".to_string(),
            })?
            .trim();

        let path = if Path::new(gitdir).is_absolute() {
            PathBuf::from(gitdir)
        } else {
            repo_path.join(gitdir)
        };
        Ok(path)
    } else {
        Err(Error::GitCommand {
            command: "find .git".to_string(),
            stderr: format!("Not a Git repository: {}", repo_path.display()),
        })
    }
}
