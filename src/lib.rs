//! # Userscript Build Library
//!
//! Turns a directory of userscript modules into distributable scripts. Each
//! built script gets a merged metadata header, a README, and a version that
//! only moves when the script actually changed since the last commit.
//!
//! ## Quick Example
//!
//! ```
//! use userscript_build::manifest::{BuildInfo, Requires};
//! use userscript_build::{merge, script};
//!
//! let source = "// ==UserScript==\n// @grant none\n// ==/UserScript==\nrun();\n";
//! let mut doc = script::parse(Some(source)).unwrap().unwrap();
//!
//! let info = BuildInfo::new("Demo", "", "", "", "");
//! merge::merge(&mut doc, &info, &Requires::default());
//! doc.set_version("1.0");
//!
//! let text = script::serialize(&doc);
//! assert!(text.contains("// @name          Demo\n// @version       1.0\n"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Documents (`script`)**: a script split into its metadata block and
//!   body, with parsing, serialization and version-blind comparison.
//! - **Manifests (`manifest`)**: per-module configured metadata, defaults and
//!   dependency URLs.
//! - **Merge (`merge`)**: combines the parsed metadata with the manifest.
//! - **Versions (`version`)**: reuses the committed version when nothing
//!   changed, otherwise stamps a new timestamp-based one.
//! - **Assembly (`assemble`)**: runs the whole pipeline for each module, with
//!   git history (`git`), transpilation (`transpile`) and README generation
//!   (`readme`) as pluggable collaborators.

pub mod assemble;
pub mod config;
pub mod defaults;
pub mod discovery;
pub mod error;
pub mod git;
pub mod manifest;
pub mod merge;
pub mod output;
pub mod readme;
pub mod script;
pub mod transpile;
pub mod version;
