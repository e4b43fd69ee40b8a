//! # Script Assembly
//!
//! Builds modules one at a time. For each module the [`Assembler`]:
//!
//! 1.  **Resolves** the entry script and loads the manifest.
//! 2.  **Transpiles** TypeScript entry scripts into the artifact location (a
//!     scratch directory in dry-run mode).
//! 3.  **Loads** the previous artifact from the build history.
//! 4.  **Parses** both scripts, **merges** the manifest into the new one and
//!     **derives** its version.
//! 5.  **Writes** the artifact and its README files.
//!
//! [`Assembler::build_all`] isolates modules from each other: a failure is
//! recorded in the report, the failed module's build directory is removed and
//! the remaining modules are still built.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ProjectConfig, ProjectPaths};
use crate::defaults::ARTIFACT_NAME;
use crate::discovery::{self, Module};
use crate::error::{Error, Result};
use crate::git::{History, NoHistory};
use crate::manifest;
use crate::merge;
use crate::readme;
use crate::script;
use crate::transpile::{needs_transpile, CommandTranspiler, Transpiler};
use crate::version::{self, Clock, SystemClock};

/// Result of one successful module build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltModule {
    pub module: String,
    pub version: String,
    pub previous_version: Option<String>,
    pub artifact: PathBuf,
    pub readmes: Vec<PathBuf>,
}

impl BuiltModule {
    /// Whether the build produced a new version.
    pub fn is_updated(&self) -> bool {
        self.previous_version.as_deref() != Some(self.version.as_str())
    }
}

/// Outcome category of a module in a [`BuildReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleStatus {
    Updated,
    Unchanged,
    Failed,
}

/// Per-module line of a [`BuildReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub module: String,
    pub status: ModuleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a whole build run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub modules: Vec<ModuleReport>,
}

impl BuildReport {
    pub fn count(&self, status: ModuleStatus) -> usize {
        self.modules.iter().filter(|m| m.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(ModuleStatus::Failed) > 0
    }
}

/// Builds modules of one project.
pub struct Assembler {
    paths: ProjectPaths,
    config: ProjectConfig,
    history: Box<dyn History>,
    transpiler: Box<dyn Transpiler>,
    clock: Box<dyn Clock>,
    dry_run: bool,
}

impl Assembler {
    /// Assembler with no history, the configured transpiler and the system
    /// clock.
    pub fn new(root: &Path, config: ProjectConfig) -> Self {
        Self {
            paths: ProjectPaths::new(root, &config),
            transpiler: Box::new(CommandTranspiler::new(config.transpiler.clone())),
            config,
            history: Box::new(NoHistory),
            clock: Box::new(SystemClock),
            dry_run: false,
        }
    }

    pub fn with_history(mut self, history: Box<dyn History>) -> Self {
        self.history = history;
        self
    }

    pub fn with_transpiler(mut self, transpiler: Box<dyn Transpiler>) -> Self {
        self.transpiler = transpiler;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Compute everything but write nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Modules of the project, sorted by name.
    pub fn discover(&self) -> Result<Vec<Module>> {
        discovery::discover_modules(&self.paths.source_dir)
    }

    /// Read the entry script, transpiling it first when needed.
    fn read_source(&self, entry: &Path, artifact: &Path) -> Result<String> {
        if !needs_transpile(entry) {
            return Ok(fs::read_to_string(entry)?);
        }

        let scratch;
        let output = if self.dry_run {
            scratch = tempfile::tempdir()?;
            scratch.path().join(ARTIFACT_NAME)
        } else {
            artifact.to_path_buf()
        };
        self.transpiler.transpile(entry, &output)?;
        fs::read_to_string(&output).map_err(|e| Error::Transpile {
            input: entry.display().to_string(),
            message: format!("no compiler output at {}: {}", output.display(), e),
        })
    }

    /// Build one module.
    pub fn build_module(&self, module: &Module) -> Result<BuiltModule> {
        let entry = discovery::find_entry_script(&module.name, &module.dir)?;
        let (info, requires) =
            manifest::load(&module.name, &module.dir, &self.config.defaults)?;
        log::info!("[{}] Building from {}", module.name, entry.display());

        let artifact = self.paths.artifact_path(&module.name);
        let dst_dir = self.paths.build_dir.join(&module.name);
        let source = self.read_source(&entry, &artifact)?;

        let repo_path = self.paths.artifact_repo_path(&module.name);
        let previous_text = self.history.previous_file(&repo_path)?;
        let previous = script::parse(previous_text.as_deref())?;
        let previous_version = previous
            .as_ref()
            .and_then(|p| p.version())
            .map(str::to_string);

        let mut doc = script::parse(Some(&source))?.unwrap_or_default();
        merge::merge(&mut doc, &info, &requires);
        let version =
            version::derive_version(previous.as_ref(), &doc, &info, self.clock.as_ref())?;
        doc.set_version(version.as_str());
        log::info!(
            "[{}] Version {} (previous: {})",
            module.name,
            version,
            previous_version.as_deref().unwrap_or("none")
        );

        let mut readmes = Vec::new();
        if !self.dry_run {
            fs::create_dir_all(&dst_dir)?;
            fs::write(&artifact, script::serialize(&doc))?;
            let urls: Vec<&str> = requires.iter().collect();
            readmes = readme::generate(
                &module.name,
                &doc,
                &urls,
                &self.config.links,
                &module.dir,
                &dst_dir,
            )?;
        }

        Ok(BuiltModule {
            module: module.name.clone(),
            version,
            previous_version,
            artifact,
            readmes,
        })
    }

    /// Remove the build output of `modules`, or the whole build directory
    /// when `modules` is `None`. Does nothing in dry-run mode.
    pub fn clean(&self, modules: Option<&[Module]>) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let dirs: Vec<PathBuf> = match modules {
            Some(modules) => modules
                .iter()
                .map(|m| self.paths.build_dir.join(&m.name))
                .collect(),
            None => vec![self.paths.build_dir.clone()],
        };
        for dir in dirs {
            if dir.exists() {
                log::debug!("Removing {}", dir.display());
                fs::remove_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Build every module in order, isolating failures.
    pub fn build_all(&self, modules: &[Module]) -> BuildReport {
        let mut report = BuildReport::default();
        for module in modules {
            let line = match self.build_module(module) {
                Ok(built) => ModuleReport {
                    module: built.module.clone(),
                    status: if built.is_updated() {
                        ModuleStatus::Updated
                    } else {
                        ModuleStatus::Unchanged
                    },
                    version: Some(built.version),
                    previous_version: built.previous_version,
                    error: None,
                },
                Err(e) => {
                    log::error!("{}", e);
                    self.discard_partial(module);
                    ModuleReport {
                        module: module.name.clone(),
                        status: ModuleStatus::Failed,
                        version: None,
                        previous_version: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.modules.push(line);
        }
        report
    }

    fn discard_partial(&self, module: &Module) {
        if self.dry_run {
            return;
        }
        let dir = self.paths.build_dir.join(&module.name);
        if dir.exists() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                log::warn!("Could not remove {}: {}", dir.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::History;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_milli_opt(10, 20, 30, 400)
                .unwrap()
        }
    }

    /// History serving canned file contents.
    struct MapHistory(HashMap<String, String>);

    impl History for MapHistory {
        fn previous_file(&self, path: &str) -> Result<Option<String>> {
            Ok(self.0.get(path).cloned())
        }
    }

    /// Transpiler that copies its input, standing in for tsc.
    struct CopyTranspiler;

    impl Transpiler for CopyTranspiler {
        fn transpile(&self, input: &Path, output: &Path) -> Result<()> {
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(input, output)?;
            Ok(())
        }
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        temp
    }

    fn add_module(root: &Path, name: &str, files: &[(&str, &str)]) -> Module {
        let dir = root.join("src").join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
        Module {
            name: name.to_string(),
            dir,
        }
    }

    fn assembler(root: &Path) -> Assembler {
        let config = ProjectConfig {
            defaults: crate::config::Defaults {
                namespace: "bid.example".to_string(),
                author: "someone".to_string(),
            },
            ..Default::default()
        };
        Assembler::new(root, config)
            .with_clock(Box::new(FixedClock))
            .with_transpiler(Box::new(CopyTranspiler))
    }

    const SOURCE: &str = "// ==UserScript==\n// @grant none\n// ==/UserScript==\n\nconsole.log(1)\n";

    #[test]
    fn test_build_module_writes_artifact_and_readme() {
        let temp = project();
        let module = add_module(
            temp.path(),
            "demo",
            &[("index.js", SOURCE), ("info.yaml", "description: A demo\n")],
        );

        let built = assembler(temp.path()).build_module(&module).unwrap();

        assert_eq!(built.version, "20240301.1020304");
        assert!(built.is_updated());
        let text = fs::read_to_string(&built.artifact).unwrap();
        assert_eq!(
            text,
            "// ==UserScript==\n\
             // @name          demo\n\
             // @namespace     bid.example\n\
             // @version       20240301.1020304\n\
             // @description   A demo\n\
             // @author        someone\n\
             // @grant         none\n\
             // ==/UserScript==\n\
             \n\
             \n\
             console.log(1)\n"
        );
        assert_eq!(built.readmes, vec![temp.path().join("build/demo/README.md")]);
    }

    #[test]
    fn test_unchanged_module_keeps_previous_version() {
        let temp = project();
        let module = add_module(
            temp.path(),
            "demo",
            &[("index.js", SOURCE), ("info.yaml", "description: A demo\n")],
        );
        let first = assembler(temp.path()).build_module(&module).unwrap();
        let committed = fs::read_to_string(&first.artifact)
            .unwrap()
            .replace("20240301.1020304", "1.2.3");

        let history = MapHistory(HashMap::from([(
            "build/demo/index.js".to_string(),
            committed,
        )]));
        let second = assembler(temp.path())
            .with_history(Box::new(history))
            .build_module(&module)
            .unwrap();

        assert_eq!(second.version, "1.2.3");
        assert!(!second.is_updated());
    }

    #[test]
    fn test_changed_module_gets_new_version() {
        let temp = project();
        let previous = "// ==UserScript==\n// @name          demo\n// @version       1.2.3\n// ==/UserScript==\n\n\nconsole.log(1)\n";
        let module = add_module(
            temp.path(),
            "demo",
            &[("index.js", "console.log(2)\n"), ("info.yaml", "")],
        );
        let history = MapHistory(HashMap::from([(
            "build/demo/index.js".to_string(),
            previous.to_string(),
        )]));

        let built = assembler(temp.path())
            .with_history(Box::new(history))
            .build_module(&module)
            .unwrap();

        assert_eq!(built.previous_version.as_deref(), Some("1.2.3"));
        assert_eq!(built.version, "20240301.1020304");
    }

    #[test]
    fn test_typescript_module_is_transpiled() {
        let temp = project();
        let module = add_module(
            temp.path(),
            "tsdemo",
            &[("main.ts", SOURCE), ("info.yaml", "version: \"1.0\"\n")],
        );

        let built = assembler(temp.path()).build_module(&module).unwrap();
        assert_eq!(built.version, "1.0.20240301.1020304");
        assert_eq!(built.artifact, temp.path().join("build/tsdemo/index.js"));
        assert!(fs::read_to_string(&built.artifact)
            .unwrap()
            .contains("// @version       1.0.20240301.1020304"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = project();
        let module = add_module(temp.path(), "tsdemo", &[("index.ts", SOURCE), ("info.yaml", "")]);

        let built = assembler(temp.path())
            .dry_run(true)
            .build_module(&module)
            .unwrap();
        assert_eq!(built.version, "20240301.1020304");
        assert!(built.readmes.is_empty());
        assert!(!temp.path().join("build").exists());
    }

    #[test]
    fn test_build_all_isolates_failures() {
        let temp = project();
        let broken = add_module(
            temp.path(),
            "broken",
            &[("index.js", SOURCE), ("main.ts", SOURCE), ("info.yaml", "")],
        );
        let good = add_module(temp.path(), "good", &[("index.js", SOURCE), ("info.yaml", "")]);
        fs::create_dir_all(temp.path().join("build/broken")).unwrap();
        fs::write(temp.path().join("build/broken/index.js"), "stale").unwrap();

        let report = assembler(temp.path()).build_all(&[broken, good]);

        assert_eq!(report.modules.len(), 2);
        assert_eq!(report.modules[0].status, ModuleStatus::Failed);
        let error = report.modules[0].error.as_deref().unwrap();
        assert!(error.contains("index.js") && error.contains("main.ts"));
        assert_eq!(report.modules[1].status, ModuleStatus::Updated);
        assert!(report.has_failures());
        assert_eq!(report.count(ModuleStatus::Updated), 1);
        assert!(!temp.path().join("build/broken").exists());
        assert!(temp.path().join("build/good/index.js").exists());
    }

    #[test]
    fn test_missing_manifest_fails_module() {
        let temp = project();
        let module = add_module(temp.path(), "demo", &[("index.js", SOURCE)]);
        let err = assembler(temp.path()).build_module(&module).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("[demo]"));
    }

    #[test]
    fn test_clean_selected_modules_only() {
        let temp = project();
        fs::create_dir_all(temp.path().join("build/a")).unwrap();
        fs::create_dir_all(temp.path().join("build/b")).unwrap();
        let a = Module {
            name: "a".to_string(),
            dir: temp.path().join("src/a"),
        };

        let asm = assembler(temp.path());
        asm.clean(Some(&[a])).unwrap();
        assert!(!temp.path().join("build/a").exists());
        assert!(temp.path().join("build/b").exists());

        asm.clean(None).unwrap();
        assert!(!temp.path().join("build").exists());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = BuildReport {
            modules: vec![ModuleReport {
                module: "demo".to_string(),
                status: ModuleStatus::Unchanged,
                version: Some("1.2.3".to_string()),
                previous_version: Some("1.2.3".to_string()),
                error: None,
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["modules"][0]["status"], "unchanged");
        assert_eq!(json["modules"][0]["version"], "1.2.3");
        assert!(json["modules"][0].get("error").is_none());
    }
}
