//! # Project Configuration
//!
//! Settings shared by every module of a userscript repository, read from an
//! optional `.userscript-build.yaml` at the project root:
//!
//! ```yaml
//! source-dir: src
//! build-dir: build
//! defaults:
//!   namespace: bid.example
//!   author: someone
//! links:
//!   - title: GitHub
//!     url: https://github.com/me/scripts/tree/master/src/{module}
//! transpiler:
//!   program: npx
//!   args: [tsc, --target, es2018, --lib, "es2018,DOM"]
//! ```
//!
//! Every field is optional. A missing file yields [`ProjectConfig::default`].
//! All paths derived from the configuration are resolved against an explicit
//! project root; nothing is read from process-wide state.

use crate::defaults;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default metadata values applied when neither the script nor the module
/// manifest provides one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub author: String,
}

/// A link rendered in every generated README.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub title: String,
    /// May contain `{module}`, replaced by the module directory name.
    pub url: String,
}

impl Link {
    pub fn url_for(&self, module: &str) -> String {
        self.url.replace("{module}", module)
    }
}

/// External command used to turn TypeScript into JavaScript.
///
/// The input path and `--outFile <output>` are appended to `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranspilerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for TranspilerConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: ["tsc", "--target", "es2018", "--lib", "es2018,DOM"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Contents of `.userscript-build.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub transpiler: TranspilerConfig,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(defaults::SOURCE_DIR)
}

fn default_build_dir() -> PathBuf {
    PathBuf::from(defaults::BUILD_DIR)
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            build_dir: default_build_dir(),
            defaults: Defaults::default(),
            links: Vec::new(),
            transpiler: TranspilerConfig::default(),
        }
    }
}

/// Parse project configuration from YAML text.
///
/// An empty document is accepted and yields the defaults.
///
/// # Examples
///
/// ```
/// use userscript_build::config;
///
/// let cfg = config::parse("build-dir: dist\n").unwrap();
/// assert_eq!(cfg.build_dir.to_str(), Some("dist"));
/// assert_eq!(cfg.source_dir.to_str(), Some("src"));
/// ```
pub fn parse(yaml_content: &str) -> Result<ProjectConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: hint_for(&e.to_string()),
    })
}

fn hint_for(message: &str) -> Option<String> {
    if message.contains("unknown field") {
        Some(
            "Valid keys are: source-dir, build-dir, defaults, links, transpiler".to_string(),
        )
    } else {
        None
    }
}

/// Load the configuration file at `path`, or the defaults when it is absent.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
    let path = path.as_ref();
    if !path.exists() {
        log::debug!("No project config at {}, using defaults", path.display());
        return Ok(ProjectConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Resolved locations of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: &Path, config: &ProjectConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            source_dir: root.join(&config.source_dir),
            build_dir: root.join(&config.build_dir),
        }
    }

    /// Artifact path of `module`, absolute.
    pub fn artifact_path(&self, module: &str) -> PathBuf {
        self.build_dir.join(module).join(defaults::ARTIFACT_NAME)
    }

    /// Artifact path of `module` relative to the root, with `/` separators,
    /// as git expects it.
    pub fn artifact_repo_path(&self, module: &str) -> String {
        let full = self.artifact_path(module);
        let rel = full.strip_prefix(&self.root).unwrap_or(&full);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
