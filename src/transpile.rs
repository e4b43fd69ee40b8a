//! TypeScript to JavaScript conversion.
//!
//! The build does not compile TypeScript itself; it runs an external
//! compiler (`npx tsc` unless configured otherwise) and reads its output.
//! A non-zero exit status is logged, not raised: a failed compile shows up as
//! a missing or stale output file when the assembler reads it.

use std::path::Path;
use std::process::Command;

use crate::config::TranspilerConfig;
use crate::error::{Error, Result};

/// Trait for the transpilation step - allows substituting it in tests
pub trait Transpiler {
    /// Compile `input` into the single file `output`.
    fn transpile(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Runs the configured external compiler.
#[derive(Debug, Clone)]
pub struct CommandTranspiler {
    config: TranspilerConfig,
}

impl CommandTranspiler {
    pub fn new(config: TranspilerConfig) -> Self {
        Self { config }
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .arg(input)
            .arg("--outFile")
            .arg(output);
        cmd
    }
}

impl Transpiler for CommandTranspiler {
    fn transpile(&self, input: &Path, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut cmd = self.command(input, output);
        log::info!("Transpiling {} -> {}", input.display(), output.display());
        log::debug!("Running {:?}", cmd);

        let status = cmd.status().map_err(|e| Error::Transpile {
            input: input.display().to_string(),
            message: format!("failed to run '{}': {}", self.config.program, e),
        })?;
        if !status.success() {
            log::warn!(
                "'{}' exited with {} while compiling {}",
                self.config.program,
                status,
                input.display()
            );
        }
        Ok(())
    }
}

/// Whether `path` needs transpiling before it can be used as a script.
pub fn needs_transpile(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ts"))
}
