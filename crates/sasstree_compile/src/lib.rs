//! `sasstree_compile` v1:
//! Rust-side style-sheet tree compiler.
//!
//! Walks a source tree, renders every matching style file through a
//! [`StyleRenderer`], and writes the results into a mirrored destination tree.
//! - `compile` : validation, traversal and per-directory compilation
//! - `lister`  : non-recursive directory listing
//! - `render`  : renderer seam and the command-line backend
//! - `spec`    : enums/options/errors
//! - `report`  : run-time report model
//! - `util`    : shared helper functions

pub mod compile;
pub mod lister;
pub mod render;
pub mod report;
pub mod spec;
mod util;

#[cfg(test)]
mod test_support;

pub use compile::{compile_tree, validate_options};
pub use lister::{list_files_by_extension, list_subdirectories};
pub use render::{C_RENDERER_PROGRAM_DEFAULT, RenderError, SpecCommandRenderer, StyleRenderer};
pub use report::{ReportCompile, ReportCompileBuilder};
pub use spec::{
    C_OUTPUT_EXTENSION_DEFAULT, C_SOURCE_EXTENSION_DEFAULT, CompileTreeError, EnumOutputStyle,
    EnumPatternMode, SpecCompileOptions, SpecCompileRequest,
};
