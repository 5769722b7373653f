//! Compile specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::util::SpecFilePatterns;

/// Output extension applied when the caller leaves it unset.
pub const C_OUTPUT_EXTENSION_DEFAULT: &str = "css";
/// Source extension matched when the caller leaves `extensions` unset.
pub const C_SOURCE_EXTENSION_DEFAULT: &str = "scss";

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Formatting mode handed to the style renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumOutputStyle {
    /// Indentation follows the nesting of the source rules.
    #[default]
    Nested,
    /// One declaration per line, no nesting indentation.
    Expanded,
    /// One rule per line.
    Compact,
    /// Minimal whitespace.
    Compressed,
}

impl EnumOutputStyle {
    /// Name understood by libsass-compatible command-line compilers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nested => "nested",
            Self::Expanded => "expanded",
            Self::Compact => "compact",
            Self::Compressed => "compressed",
        }
    }
}

/// Pattern matching mode for exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Caller-built input for `compile_tree`.
///
/// Every field is optional here; [`crate::validate_options`] rejects missing
/// directories and fills in the remaining defaults.
#[derive(Debug, Clone, Default)]
pub struct SpecCompileOptions {
    /// Root of the style-source tree.
    pub source_directory: Option<PathBuf>,
    /// Root of the mirrored output tree.
    pub destination_directory: Option<PathBuf>,
    /// Suffix of every produced file, without the dot. Defaults to `css`.
    pub output_extension: Option<String>,
    /// Source extensions to match. Defaults to `["scss"]`.
    pub extensions: Option<Vec<String>>,
    /// Import search paths passed through to the renderer.
    pub include_paths: Option<Vec<PathBuf>>,
    /// Basename patterns removed from the matched file list.
    pub patterns_exclude_files: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumPatternMode,
    /// Formatting mode handed to the renderer.
    pub rule_output_style: EnumOutputStyle,
    /// Maximum worker threads for the per-directory render stage.
    pub num_workers_max: Option<usize>,
    /// Do not render or write; record what would happen.
    pub if_dry_run: bool,
}

/// Validated, immutable request driving one traversal.
///
/// Child requests differ from their parent only in the two directory fields.
#[derive(Debug, Clone)]
pub struct SpecCompileRequest {
    pub(crate) path_dir_src: PathBuf,
    pub(crate) path_dir_dst: PathBuf,
    pub(crate) output_extension: String,
    pub(crate) extensions: Vec<String>,
    pub(crate) include_paths: Vec<PathBuf>,
    pub(crate) spec_file_pats: SpecFilePatterns,
    pub(crate) rule_output_style: EnumOutputStyle,
    pub(crate) n_workers_max: usize,
    pub(crate) if_dry_run: bool,
}

impl SpecCompileRequest {
    pub fn source_directory(&self) -> &PathBuf {
        &self.path_dir_src
    }

    pub fn destination_directory(&self) -> &PathBuf {
        &self.path_dir_dst
    }

    pub fn output_extension(&self) -> &str {
        &self.output_extension
    }

    /// Normalised source extensions, without leading dots, in caller order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    pub fn rule_output_style(&self) -> EnumOutputStyle {
        self.rule_output_style
    }

    /// Request for a child directory: destination becomes `dst / basename(child)`.
    pub(crate) fn for_subdirectory(&self, path_dir_src_sub: PathBuf) -> Self {
        let path_dir_dst_sub = match path_dir_src_sub.file_name() {
            Some(name_dir) => self.path_dir_dst.join(name_dir),
            None => self.path_dir_dst.clone(),
        };
        Self {
            path_dir_src: path_dir_src_sub,
            path_dir_dst: path_dir_dst_sub,
            ..self.clone()
        }
    }
}

/// Errors surfaced by one `compile_tree` call. The first failure aborts the run.
#[derive(Debug, Error)]
pub enum CompileTreeError {
    /// Request or a required field is absent, empty, or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A directory field is present but not a string value.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Top-level source directory does not exist.
    #[error("Source directory does not exist: {}", .0.display())]
    NotFound(PathBuf),
    /// The style renderer rejected a source file.
    #[error("Failed to compile {}: {message}", .path.display())]
    Compile {
        /// Offending source file.
        path: PathBuf,
        /// Renderer diagnostic text.
        message: String,
    },
    /// Listing, directory creation, or file write failed.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path the failing operation touched.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl CompileTreeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
