//! Module discovery.
//!
//! Every sub-directory of the source directory is a module. A module holds a
//! manifest and exactly one entry script: a `.js` or `.ts` file whose name
//! contains `index` or `main` (case-insensitive).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A module directory found under the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Directory name, used as the module name and the build sub-directory.
    pub name: String,
    pub dir: PathBuf,
}

/// List the modules of `source_dir`, sorted by name.
///
/// Hidden directories are skipped.
pub fn discover_modules(source_dir: &Path) -> Result<Vec<Module>> {
    if !source_dir.is_dir() {
        return Err(Error::ConfigParse {
            message: format!("source directory not found: {}", source_dir.display()),
            hint: Some("Set 'source-dir' in .userscript-build.yaml or pass --root".to_string()),
        });
    }

    let mut modules = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        modules.push(Module {
            name,
            dir: entry.path(),
        });
    }
    modules.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("Discovered {} module(s) in {}", modules.len(), source_dir.display());
    Ok(modules)
}

/// Whether `file_name` looks like an entry script.
pub fn is_entry_candidate(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    (lower.contains("index") || lower.contains("main"))
        && (lower.ends_with(".js") || lower.ends_with(".ts"))
}

/// Find the single entry script of a module directory.
pub fn find_entry_script(module: &str, dir: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if is_entry_candidate(&file_name) {
            candidates.push(file_name);
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Err(Error::MissingEntryScript {
            module: module.to_string(),
        }),
        1 => Ok(dir.join(&candidates[0])),
        _ => Err(Error::AmbiguousEntryScript {
            module: module.to_string(),
            files: candidates,
        }),
    }
}
