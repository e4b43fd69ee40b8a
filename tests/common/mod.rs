//! Shared test utilities for E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_module("demo", scripts::PLAIN, manifests::MINIMAL);
//!     fixture.command().args(["build", "--no-history"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{manifests, scripts};
    pub use super::TestFixture;
}

/// Entry script snippets.
#[allow(dead_code)]
pub mod scripts {
    /// Script with a header declaring a grant and a match pattern.
    pub const PLAIN: &str = "// ==UserScript==\n// @grant none\n// @match https://example.com/*\n// ==/UserScript==\n\nconsole.log('hello');\n";

    /// The same script with a different body.
    pub const CHANGED: &str = "// ==UserScript==\n// @grant none\n// @match https://example.com/*\n// ==/UserScript==\n\nconsole.log('changed');\n";

    /// Script without any header.
    pub const HEADERLESS: &str = "console.log('bare');\n";
}

/// Manifest snippets.
#[allow(dead_code)]
pub mod manifests {
    pub const MINIMAL: &str = "name: Demo Script\ndescription: Says hello\n";

    pub const WITH_PREFIX: &str = "name: Demo Script\nversion: \"2.0\"\ndescription: Says hello\n";

    pub const WITH_REQUIRE: &str = "name: Demo Script\nrequire:\n  - https://cdn.example.com/lib.js\njquery: true\n";

    pub const INVALID: &str = "name: [unterminated\n";
}

/// A temporary project directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add `.userscript-build.yaml` with the given content.
    #[allow(dead_code)]
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".userscript-build.yaml", content)
    }

    /// Add a module under `src/` with an `index.js` entry script and an
    /// `info.yaml` manifest.
    pub fn with_module(self, name: &str, script: &str, manifest: &str) -> Self {
        self.with_file(&format!("src/{}/index.js", name), script)
            .with_file(&format!("src/{}/info.yaml", name), manifest)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Turn the directory into a git repository with one commit of
    /// everything currently in it.
    #[allow(dead_code)]
    pub fn with_git_commit(self) -> Self {
        self.git(&["init", "-q"]);
        self.git(&["config", "user.email", "test@example.com"]);
        self.git(&["config", "user.name", "Test"]);
        self.commit_all("initial");
        self
    }

    /// Stage and commit everything.
    #[allow(dead_code)]
    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the built script of `module` under the default build dir.
    #[allow(dead_code)]
    pub fn artifact(&self, module: &str) -> PathBuf {
        self.path().join("build").join(module).join("index.js")
    }

    /// Read the built script of `module`.
    #[allow(dead_code)]
    pub fn read_artifact(&self, module: &str) -> String {
        std::fs::read_to_string(self.artifact(module)).expect("Failed to read artifact")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("userscript-build");
        cmd.current_dir(self.path());
        cmd.env_remove("USERSCRIPT_BUILD_ROOT");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_module() {
        let fixture = TestFixture::new().with_module("demo", scripts::PLAIN, manifests::MINIMAL);
        assert!(fixture.path().join("src/demo/index.js").exists());
        assert!(fixture.path().join("src/demo/info.yaml").exists());
    }

    #[test]
    fn test_manifests_are_valid_yaml() {
        for manifest in [manifests::MINIMAL, manifests::WITH_PREFIX, manifests::WITH_REQUIRE] {
            serde_yaml::from_str::<serde_yaml::Value>(manifest).expect("Manifest should be valid YAML");
        }
        assert!(serde_yaml::from_str::<serde_yaml::Value>(manifests::INVALID).is_err());
    }
}
