//! Default names and locations used across the build.
//!
//! Centralised so commands, discovery and tests agree on them.

/// Project configuration file name, looked up at the project root.
pub const PROJECT_CONFIG_FILE: &str = ".userscript-build.yaml";

/// Directory holding one sub-directory per module.
pub const SOURCE_DIR: &str = "src";

/// Directory receiving the built artifacts.
pub const BUILD_DIR: &str = "build";

/// File name of a built script inside `build/<module>/`.
pub const ARTIFACT_NAME: &str = "index.js";

/// Accepted module manifest file names, in lookup order.
pub const MANIFEST_NAMES: [&str; 3] = ["info.yaml", "info.yml", "info.toml"];

/// Dependency added by `jquery: true` in a manifest.
pub const JQUERY_URL: &str = "https://code.jquery.com/jquery-latest.js";
