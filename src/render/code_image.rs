use std::path::PathBuf;
use std::process::Command;

use anyhow::Context as _;

use crate::cache::key::RenderKind;
use crate::foundation::error::{ScriptcastError, ScriptcastResult};

/// Source-code-to-image backend.
pub trait CodeImageRenderer: Send + Sync {
    /// Render `source` (highlighted as a file with `extension`, e.g. `.py`) to PNG bytes.
    fn render(&self, source: &str, extension: &str) -> ScriptcastResult<Vec<u8>>;
}

/// The `carbon-now` CLI. Runs headless (`-h`) inside a scratch directory.
#[derive(Clone, Debug)]
pub struct CarbonNow {
    program: PathBuf,
}

impl Default for CarbonNow {
    fn default() -> Self {
        Self {
            program: PathBuf::from("carbon-now"),
        }
    }
}

impl CarbonNow {
    /// Use a specific `carbon-now`-compatible executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CodeImageRenderer for CarbonNow {
    fn render(&self, source: &str, extension: &str) -> ScriptcastResult<Vec<u8>> {
        let scratch = tempfile::tempdir().context("create code image scratch directory")?;
        let source_path = scratch.path().join(format!("source{extension}"));
        let stem = scratch.path().join("image");
        std::fs::write(&source_path, format!("{source}\n"))
            .with_context(|| format!("write code source '{}'", source_path.display()))?;

        let out = Command::new(&self.program)
            .arg(&source_path)
            .arg("-h")
            .arg("-t")
            .arg(&stem)
            .output()
            .map_err(|e| {
                ScriptcastError::render_failed(
                    RenderKind::CodeImage,
                    format!("failed to run '{}': {e}", self.program.display()),
                )
            })?;
        if !out.status.success() {
            return Err(ScriptcastError::render_failed(
                RenderKind::CodeImage,
                format!(
                    "'{}' exited with {}: {}",
                    self.program.display(),
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            ));
        }

        let png_path = stem.with_extension("png");
        std::fs::read(&png_path).map_err(|e| {
            ScriptcastError::render_failed(
                RenderKind::CodeImage,
                format!("expected image at '{}': {e}", png_path.display()),
            )
        })
    }
}
