use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::Command;

/// The seam between the pipeline and the external decode tooling. Each
/// call converts one batch of raw `.bin` files in place, dropping
/// `.clut`/`.rgba` siblings next to them.
pub trait BinBatchDecoder: Send + Sync {
    fn decode_bin_batch(&self, paths: &[PathBuf]) -> Result<()>;
}

/// Runs one of the legacy decode scripts under a configured interpreter.
pub struct ScriptDecoder {
    interpreter: String,
    script: PathBuf,
}

impl ScriptDecoder {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }
}

impl BinBatchDecoder for ScriptDecoder {
    fn decode_bin_batch(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let output = Command::new(&self.interpreter)
            .arg(&self.script)
            .args(paths)
            .output()
            .with_context(|| {
                format!(
                    "Failed to run {} {}",
                    self.interpreter,
                    self.script.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} exited with {}: {}",
                self.script.display(),
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

/// Probe the interpreter once before any work begins.
pub fn check_tool_available(interpreter: &str) -> Result<()> {
    let result = Command::new(interpreter).arg("--version").output();

    match result {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => bail!("'{}' is present but not runnable", interpreter),
        Err(e) => bail!(
            "'{}' not found: {}. Install it before ripping.",
            interpreter,
            e
        ),
    }
}
