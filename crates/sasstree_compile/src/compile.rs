//! Option validation, mirrored tree traversal, and per-directory compilation.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::lister::{list_files_by_extension, list_subdirectories};
use crate::render::{RenderError, StyleRenderer};
use crate::report::{ReportCompile, ReportCompileBuilder};
use crate::spec::{
    C_OUTPUT_EXTENSION_DEFAULT, C_SOURCE_EXTENSION_DEFAULT, CompileTreeError, SpecCompileOptions,
    SpecCompileRequest,
};
use crate::util::{
    SpecFilePatterns, calculate_worker_limit, derive_destination_filepath, normalize_extensions,
};

#[derive(Debug, Clone)]
struct SpecRenderTask {
    path_file_src: PathBuf,
    path_file_dst: PathBuf,
}

struct SpecCompileContext<'a, R: StyleRenderer + ?Sized> {
    renderer: &'a R,
    thread_pool: Option<ThreadPool>,
    builder_report: ReportCompileBuilder,
}

/// Check the caller's options and build the immutable request.
///
/// Fails before any filesystem access:
/// - [`CompileTreeError::InvalidArgument`] when `options` is `None`, a directory is
///   missing or empty, an extension entry is blank, or an exclude pattern is invalid;
/// - [`CompileTreeError::TypeMismatch`] when a directory is not valid UTF-8.
///
/// An empty `output_extension` falls back to `css`, same as an absent one.
pub fn validate_options(
    options: Option<SpecCompileOptions>,
) -> Result<SpecCompileRequest, CompileTreeError> {
    let Some(options) = options else {
        return Err(CompileTreeError::InvalidArgument(
            "Options are required to compile a style tree.".to_string(),
        ));
    };

    let path_dir_src = validate_directory("source_directory", options.source_directory)?;
    let path_dir_dst = validate_directory("destination_directory", options.destination_directory)?;

    let output_extension = match options.output_extension {
        Some(c_ext) if !c_ext.is_empty() => c_ext,
        _ => C_OUTPUT_EXTENSION_DEFAULT.to_string(),
    };
    if output_extension.contains(['/', '\\']) {
        return Err(CompileTreeError::InvalidArgument(format!(
            "`output_extension` must not contain path separators: `{output_extension}`"
        )));
    }

    let extensions = match options.extensions {
        Some(l_exts) => {
            normalize_extensions(&l_exts).map_err(CompileTreeError::InvalidArgument)?
        }
        None => vec![C_SOURCE_EXTENSION_DEFAULT.to_string()],
    };

    let spec_file_pats = SpecFilePatterns::from_raw(
        options.patterns_exclude_files.as_deref(),
        options.rule_pattern,
    )?;

    Ok(SpecCompileRequest {
        path_dir_src,
        path_dir_dst,
        output_extension,
        extensions,
        include_paths: options.include_paths.unwrap_or_default(),
        spec_file_pats,
        rule_output_style: options.rule_output_style,
        n_workers_max: calculate_worker_limit(options.num_workers_max),
        if_dry_run: options.if_dry_run,
    })
}

fn validate_directory(
    name_field: &str,
    directory: Option<PathBuf>,
) -> Result<PathBuf, CompileTreeError> {
    let Some(path_dir) = directory else {
        return Err(CompileTreeError::InvalidArgument(format!(
            "`{name_field}` is required."
        )));
    };
    if path_dir.as_os_str().is_empty() {
        return Err(CompileTreeError::InvalidArgument(format!(
            "`{name_field}` must not be empty."
        )));
    }
    if path_dir.to_str().is_none() {
        return Err(CompileTreeError::TypeMismatch(format!(
            "`{name_field}` must be a UTF-8 string: {}",
            path_dir.display()
        )));
    }
    Ok(path_dir)
}

/// Compile every matching file under the source tree into the mirrored destination tree.
///
/// Directories are walked depth-first in name order; a directory's own files are
/// finished before its subdirectories are entered. The first failure anywhere aborts
/// the run and is returned unchanged. Files written before the failure stay on disk.
pub fn compile_tree<R>(
    options: Option<SpecCompileOptions>,
    renderer: &R,
) -> Result<ReportCompile, CompileTreeError>
where
    R: StyleRenderer + ?Sized,
{
    let spec_req = validate_options(options)?;

    info!("Compiling SASS files to CSS");
    info!("SASS directory: {}", spec_req.path_dir_src.display());
    info!("CSS directory: {}", spec_req.path_dir_dst.display());

    if !spec_req.path_dir_src.is_dir() {
        return Err(CompileTreeError::NotFound(spec_req.path_dir_src));
    }

    let mut spec_ctx = SpecCompileContext {
        renderer,
        thread_pool: build_thread_pool(spec_req.n_workers_max),
        builder_report: ReportCompileBuilder::default(),
    };
    walk_tree(&spec_req, &mut spec_ctx)?;

    let report = spec_ctx.builder_report.build();
    info!("{report}");
    Ok(report)
}

fn build_thread_pool(n_workers_max: usize) -> Option<ThreadPool> {
    if n_workers_max <= 1 {
        return None;
    }
    match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
        Ok(thread_pool) => Some(thread_pool),
        Err(e) => {
            warn!(
                "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial render. ({e})"
            );
            None
        }
    }
}

fn walk_tree<R>(
    spec_req: &SpecCompileRequest,
    spec_ctx: &mut SpecCompileContext<'_, R>,
) -> Result<(), CompileTreeError>
where
    R: StyleRenderer + ?Sized,
{
    let l_dirs_sub = list_subdirectories(&spec_req.path_dir_src)?;

    compile_directory(spec_req, spec_ctx)?;

    for path_dir_src_sub in l_dirs_sub {
        let spec_req_sub = spec_req.for_subdirectory(path_dir_src_sub);
        walk_tree(&spec_req_sub, spec_ctx)?;
    }
    Ok(())
}

fn compile_directory<R>(
    spec_req: &SpecCompileRequest,
    spec_ctx: &mut SpecCompileContext<'_, R>,
) -> Result<(), CompileTreeError>
where
    R: StyleRenderer + ?Sized,
{
    debug!("Visiting directory: {}", spec_req.path_dir_src.display());
    spec_ctx.builder_report.add_dir_visited();

    let l_files = list_files_by_extension(&spec_req.path_dir_src, &spec_req.extensions)?;
    spec_ctx.builder_report.add_matched(l_files.len() as u64);

    let mut l_tasks = Vec::with_capacity(l_files.len());
    for path_file_src in l_files {
        let name_file = path_file_src
            .file_name()
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_default();
        if spec_req.spec_file_pats.is_excluded(&name_file) {
            debug!("Excluded by pattern: {}", path_file_src.display());
            spec_ctx.builder_report.add_excluded();
            continue;
        }
        let path_file_dst = derive_destination_filepath(
            &path_file_src,
            &spec_req.path_dir_dst,
            &spec_req.output_extension,
        );
        l_tasks.push(SpecRenderTask {
            path_file_src,
            path_file_dst,
        });
    }

    if spec_req.if_dry_run {
        for spec_task in l_tasks {
            info!(
                "[dry-run] would compile {} -> {}",
                spec_task.path_file_src.display(),
                spec_task.path_file_dst.display()
            );
            spec_ctx.builder_report.add_skipped(spec_task.path_file_dst);
        }
        return Ok(());
    }

    let renderer = spec_ctx.renderer;
    match spec_ctx.thread_pool.as_ref() {
        Some(thread_pool) if l_tasks.len() > 1 => {
            let l_results = thread_pool.install(|| {
                l_tasks
                    .par_iter()
                    .map(|spec_task| render_file(renderer, spec_req, &spec_task.path_file_src))
                    .collect::<Vec<_>>()
            });
            for (spec_task, res_render) in l_tasks.into_iter().zip(l_results) {
                log_task(&spec_task);
                commit_output(spec_req, &spec_task.path_file_dst, &res_render?)?;
                spec_ctx.builder_report.add_compiled(spec_task.path_file_dst);
            }
        }
        _ => {
            for spec_task in l_tasks {
                log_task(&spec_task);
                let txt_css = render_file(renderer, spec_req, &spec_task.path_file_src)?;
                commit_output(spec_req, &spec_task.path_file_dst, &txt_css)?;
                spec_ctx.builder_report.add_compiled(spec_task.path_file_dst);
            }
        }
    }
    Ok(())
}

fn log_task(spec_task: &SpecRenderTask) {
    info!(
        "compiling {} -> {}",
        spec_task.path_file_src.display(),
        spec_task.path_file_dst.display()
    );
}

fn render_file<R>(
    renderer: &R,
    spec_req: &SpecCompileRequest,
    path_file_src: &Path,
) -> Result<String, CompileTreeError>
where
    R: StyleRenderer + ?Sized,
{
    renderer
        .render(
            path_file_src,
            &spec_req.include_paths,
            spec_req.rule_output_style,
        )
        .map_err(|e| match e {
            RenderError::Diagnostic(message) => CompileTreeError::Compile {
                path: path_file_src.to_path_buf(),
                message,
            },
            RenderError::Io { program, source } => CompileTreeError::io(program, source),
        })
}

fn commit_output(
    spec_req: &SpecCompileRequest,
    path_file_dst: &Path,
    txt_css: &str,
) -> Result<(), CompileTreeError> {
    fs::create_dir_all(&spec_req.path_dir_dst)
        .map_err(|e| CompileTreeError::io(&spec_req.path_dir_dst, e))?;
    fs::write(path_file_dst, txt_css).map_err(|e| CompileTreeError::io(path_file_dst, e))
}
