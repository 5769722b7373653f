//! Style renderer seam: turn one source file into compiled text.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::spec::EnumOutputStyle;

/// Default libsass command-line front end.
pub const C_RENDERER_PROGRAM_DEFAULT: &str = "sassc";

#[derive(Debug, Error)]
pub enum RenderError {
    /// The compiler rejected the source (syntax error, unresolved import, ...).
    #[error("{0}")]
    Diagnostic(String),
    /// The compiler could not be run at all.
    #[error("Failed to run `{}`: {source}", .program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Compiles one style-language source file into output text.
///
/// Implementations must be shareable across the render worker pool.
pub trait StyleRenderer: Sync {
    fn render(
        &self,
        path_file_src: &Path,
        include_paths: &[PathBuf],
        rule_output_style: EnumOutputStyle,
    ) -> Result<String, RenderError>;
}

impl<F> StyleRenderer for F
where
    F: Fn(&Path, &[PathBuf], EnumOutputStyle) -> Result<String, RenderError> + Sync,
{
    fn render(
        &self,
        path_file_src: &Path,
        include_paths: &[PathBuf],
        rule_output_style: EnumOutputStyle,
    ) -> Result<String, RenderError> {
        self(path_file_src, include_paths, rule_output_style)
    }
}

/// Renders through an external libsass-compatible CLI:
/// `<program> [args_extra...] --style <mode> [--load-path <dir>]... <file>`,
/// reading the compiled text from stdout.
#[derive(Debug, Clone)]
pub struct SpecCommandRenderer {
    pub program: PathBuf,
    pub args_extra: Vec<String>,
}

impl SpecCommandRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args_extra: Vec::new(),
        }
    }

    /// Resolve `name` on `PATH`.
    pub fn locate(name: &str) -> Result<Self, RenderError> {
        let path_program = which::which(name).map_err(|e| RenderError::Io {
            program: PathBuf::from(name),
            source: io::Error::new(io::ErrorKind::NotFound, e.to_string()),
        })?;
        Ok(Self::new(path_program))
    }

    fn build_command(
        &self,
        path_file_src: &Path,
        include_paths: &[PathBuf],
        rule_output_style: EnumOutputStyle,
    ) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args_extra)
            .arg("--style")
            .arg(rule_output_style.as_str());
        for path_include in include_paths {
            cmd.arg("--load-path").arg(path_include);
        }
        cmd.arg(path_file_src);
        cmd
    }
}

impl Default for SpecCommandRenderer {
    fn default() -> Self {
        Self::new(C_RENDERER_PROGRAM_DEFAULT)
    }
}

impl StyleRenderer for SpecCommandRenderer {
    fn render(
        &self,
        path_file_src: &Path,
        include_paths: &[PathBuf],
        rule_output_style: EnumOutputStyle,
    ) -> Result<String, RenderError> {
        let output = self
            .build_command(path_file_src, include_paths, rule_output_style)
            .output()
            .map_err(|e| RenderError::Io {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let c_stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RenderError::Diagnostic(if c_stderr.is_empty() {
                format!("`{}` exited with {}", self.program.display(), output.status)
            } else {
                c_stderr
            }));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| RenderError::Diagnostic(format!("Compiler output is not UTF-8: {e}")))
    }
}
