//! sasstree: compile a Sass source tree into a mirrored CSS tree

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sasstree_compile::{
    C_RENDERER_PROGRAM_DEFAULT, EnumOutputStyle, EnumPatternMode, SpecCommandRenderer,
    SpecCompileOptions, compile_tree,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ArgOutputStyle {
    Nested,
    Expanded,
    Compact,
    Compressed,
}

impl From<ArgOutputStyle> for EnumOutputStyle {
    fn from(value: ArgOutputStyle) -> Self {
        match value {
            ArgOutputStyle::Nested => Self::Nested,
            ArgOutputStyle::Expanded => Self::Expanded,
            ArgOutputStyle::Compact => Self::Compact,
            ArgOutputStyle::Compressed => Self::Compressed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ArgPatternMode {
    Glob,
    Regex,
    Literal,
}

impl From<ArgPatternMode> for EnumPatternMode {
    fn from(value: ArgPatternMode) -> Self {
        match value {
            ArgPatternMode::Glob => Self::Glob,
            ArgPatternMode::Regex => Self::Regex,
            ArgPatternMode::Literal => Self::Literal,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sasstree")]
#[command(about = "Compile every Sass file under a directory into a mirrored CSS directory")]
#[command(version)]
struct Args {
    /// Directory holding the style sources
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Directory receiving the compiled files
    #[arg(value_name = "DESTINATION")]
    destination: PathBuf,

    /// Extension of produced files
    #[arg(short = 'o', long, value_name = "EXT")]
    output_extension: Option<String>,

    /// Source extension to compile (repeatable, default: scss)
    #[arg(short = 'e', long = "extension", value_name = "EXT")]
    extensions: Vec<String>,

    /// Import search path handed to the compiler (repeatable)
    #[arg(short = 'I', long = "include-path", value_name = "DIR")]
    include_paths: Vec<PathBuf>,

    /// Output formatting mode
    #[arg(long, value_enum, default_value_t = ArgOutputStyle::Nested)]
    style: ArgOutputStyle,

    /// File-name pattern to skip (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    patterns_exclude: Vec<String>,

    /// How `--exclude` patterns are interpreted
    #[arg(long, value_enum, default_value_t = ArgPatternMode::Glob)]
    pattern_mode: ArgPatternMode,

    /// Render files of one directory on this many threads
    #[arg(short = 'j', long, value_name = "N")]
    workers: Option<usize>,

    /// List what would be compiled without writing anything
    #[arg(long)]
    dry_run: bool,

    /// libsass-compatible compiler executable
    #[arg(long, value_name = "PROGRAM", default_value = C_RENDERER_PROGRAM_DEFAULT)]
    compiler: String,

    /// Show per-directory detail
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn to_options(&self) -> SpecCompileOptions {
        SpecCompileOptions {
            source_directory: Some(self.source.clone()),
            destination_directory: Some(self.destination.clone()),
            output_extension: self.output_extension.clone(),
            extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
            include_paths: Some(self.include_paths.clone()),
            patterns_exclude_files: (!self.patterns_exclude.is_empty())
                .then(|| self.patterns_exclude.clone()),
            rule_pattern: self.pattern_mode.into(),
            rule_output_style: self.style.into(),
            num_workers_max: self.workers,
            if_dry_run: self.dry_run,
        }
    }

    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stdout)
        .init();
}

fn renderer_for(args: &Args) -> Result<SpecCommandRenderer> {
    if args.dry_run {
        return Ok(SpecCommandRenderer::new(&args.compiler));
    }
    let renderer = SpecCommandRenderer::locate(&args.compiler)
        .with_context(|| format!("`{}` not found. Please install it first.", args.compiler))?;
    debug!("Using compiler: {}", renderer.program.display());
    Ok(renderer)
}

fn run(args: &Args) -> Result<()> {
    let renderer = renderer_for(args)?;

    let report = compile_tree(Some(args.to_options()), &renderer).with_context(|| {
        format!(
            "Failed to compile {} into {}",
            args.source.display(),
            args.destination.display()
        )
    })?;
    debug!("Outputs written: {}", report.l_outputs.len());
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_level());

    if let Err(e) = run(&args) {
        error!("{e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use sasstree_compile::{EnumOutputStyle, EnumPatternMode};

    use super::{Args, renderer_for};

    #[test]
    fn defaults_leave_options_unset() {
        let args = Args::try_parse_from(["sasstree", "styles", "public/css"]).expect("parse");
        let spec_options = args.to_options();

        assert_eq!(spec_options.source_directory, Some(PathBuf::from("styles")));
        assert_eq!(
            spec_options.destination_directory,
            Some(PathBuf::from("public/css"))
        );
        assert_eq!(spec_options.output_extension, None);
        assert_eq!(spec_options.extensions, None);
        assert_eq!(spec_options.include_paths, Some(vec![]));
        assert_eq!(spec_options.rule_output_style, EnumOutputStyle::Nested);
        assert_eq!(args.compiler, "sassc");
        assert_eq!(args.log_level(), "info");
    }

    #[test]
    fn flags_map_to_options() {
        let args = Args::try_parse_from([
            "sasstree",
            "styles",
            "out",
            "-o",
            "out",
            "-e",
            "scss",
            "-e",
            "sass",
            "-I",
            "vendor",
            "--style",
            "compressed",
            "--exclude",
            "^_",
            "--pattern-mode",
            "regex",
            "-j",
            "4",
            "--dry-run",
            "-v",
        ])
        .expect("parse");
        let spec_options = args.to_options();

        assert_eq!(spec_options.output_extension.as_deref(), Some("out"));
        assert_eq!(
            spec_options.extensions,
            Some(vec!["scss".to_string(), "sass".to_string()])
        );
        assert_eq!(spec_options.include_paths, Some(vec![PathBuf::from("vendor")]));
        assert_eq!(spec_options.rule_output_style, EnumOutputStyle::Compressed);
        assert_eq!(
            spec_options.patterns_exclude_files,
            Some(vec!["^_".to_string()])
        );
        assert_eq!(spec_options.rule_pattern, EnumPatternMode::Regex);
        assert_eq!(spec_options.num_workers_max, Some(4));
        assert!(spec_options.if_dry_run);
        assert_eq!(args.log_level(), "debug");
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["sasstree", "a", "b", "-v", "-q"]).is_err());
    }

    #[test]
    fn destination_is_required() {
        assert!(Args::try_parse_from(["sasstree", "styles"]).is_err());
    }

    #[test]
    fn dry_run_skips_compiler_lookup() {
        let args = Args::try_parse_from([
            "sasstree",
            "styles",
            "out",
            "--dry-run",
            "--compiler",
            "sasstree-missing-compiler",
        ])
        .expect("parse");
        let renderer = renderer_for(&args).expect("dry run needs no compiler");
        assert_eq!(renderer.program, PathBuf::from("sasstree-missing-compiler"));
    }

    #[test]
    fn missing_compiler_is_reported() {
        let args = Args::try_parse_from([
            "sasstree",
            "styles",
            "out",
            "--compiler",
            "sasstree-missing-compiler",
        ])
        .expect("parse");
        let err = renderer_for(&args).expect_err("must fail");
        assert!(format!("{err:#}").contains("`sasstree-missing-compiler` not found"));
    }
}
