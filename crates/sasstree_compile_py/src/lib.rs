use std::collections::BTreeMap;
use std::path::PathBuf;

use pyo3::exceptions::{
    PyFileNotFoundError, PyOSError, PyRuntimeError, PyTypeError, PyValueError,
};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use sasstree_compile::{
    C_RENDERER_PROGRAM_DEFAULT, CompileTreeError, EnumOutputStyle, EnumPatternMode,
    ReportCompile, SpecCommandRenderer, SpecCompileOptions, compile_tree,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "sasstree.compile.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "ReportCompile")]
#[derive(Debug, Clone)]
struct PyReportCompile {
    #[pyo3(get)]
    cnt_dirs_visited: u64,
    #[pyo3(get)]
    cnt_files_matched: u64,
    #[pyo3(get)]
    cnt_files_compiled: u64,
    #[pyo3(get)]
    cnt_files_skipped: u64,
    #[pyo3(get)]
    cnt_files_excluded: u64,
    #[pyo3(get)]
    outputs: Vec<String>,
    report: ReportCompile,
}

impl From<ReportCompile> for PyReportCompile {
    fn from(report_compile: ReportCompile) -> Self {
        Self {
            cnt_dirs_visited: report_compile.cnt_dirs_visited,
            cnt_files_matched: report_compile.cnt_files_matched,
            cnt_files_compiled: report_compile.cnt_files_compiled,
            cnt_files_skipped: report_compile.cnt_files_skipped,
            cnt_files_excluded: report_compile.cnt_files_excluded,
            outputs: report_compile
                .l_outputs
                .iter()
                .map(|v| v.to_string_lossy().to_string())
                .collect(),
            report: report_compile,
        }
    }
}

#[pymethods]
impl PyReportCompile {
    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report.to_dict()
    }

    #[pyo3(signature = (prefix = "[SASS]"))]
    fn format(&self, prefix: &str) -> String {
        self.report.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report.to_string()
    }
}

fn parse_rule_pattern(value: &str) -> PyResult<EnumPatternMode> {
    match value {
        "glob" => Ok(EnumPatternMode::Glob),
        "regex" => Ok(EnumPatternMode::Regex),
        "literal" => Ok(EnumPatternMode::Literal),
        _ => Err(PyValueError::new_err(format!(
            "Invalid pattern strategy: `{value}`. Expected one of: ['glob', 'regex', 'literal']"
        ))),
    }
}

fn parse_output_style(value: &str) -> PyResult<EnumOutputStyle> {
    match value {
        "nested" => Ok(EnumOutputStyle::Nested),
        "expanded" => Ok(EnumOutputStyle::Expanded),
        "compact" => Ok(EnumOutputStyle::Compact),
        "compressed" => Ok(EnumOutputStyle::Compressed),
        _ => Err(PyValueError::new_err(format!(
            "Invalid output style: `{value}`. Expected one of: ['nested', 'expanded', 'compact', 'compressed']"
        ))),
    }
}

fn map_compile_tree_error(exception: CompileTreeError) -> PyErr {
    match exception {
        CompileTreeError::InvalidArgument(message) => PyValueError::new_err(message),
        CompileTreeError::TypeMismatch(message) => PyTypeError::new_err(message),
        CompileTreeError::NotFound(path) => PyFileNotFoundError::new_err(format!(
            "The `source_directory` provided does not exist: {}",
            path.display()
        )),
        exception @ CompileTreeError::Compile { .. } => {
            PyRuntimeError::new_err(exception.to_string())
        }
        exception @ CompileTreeError::Io { .. } => PyOSError::new_err(exception.to_string()),
    }
}

/// Present, non-`None` value of `key`.
fn get_option<'py>(
    dict_options: &Bound<'py, PyDict>,
    key: &str,
) -> PyResult<Option<Bound<'py, PyAny>>> {
    Ok(dict_options.get_item(key)?.filter(|v| !v.is_none()))
}

fn type_mismatch(key: &str, value: &Bound<'_, PyAny>, expected: &str) -> PyErr {
    let name_type = value
        .get_type()
        .name()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "?".to_string());
    map_compile_tree_error(CompileTreeError::TypeMismatch(format!(
        "`{key}` must be {expected}, got `{name_type}`."
    )))
}

/// Falsy values count as empty; other non-`str` values are a type mismatch.
fn extract_directory(dict_options: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<PathBuf>> {
    let Some(value) = get_option(dict_options, key)? else {
        return Ok(None);
    };
    if !value.is_truthy()? {
        return Ok(Some(PathBuf::new()));
    }
    match value.extract::<String>() {
        Ok(c_dir) => Ok(Some(PathBuf::from(c_dir))),
        Err(_) => Err(type_mismatch(key, &value, "a string")),
    }
}

fn extract_string(dict_options: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<String>> {
    let Some(value) = get_option(dict_options, key)? else {
        return Ok(None);
    };
    value
        .extract::<String>()
        .map(Some)
        .map_err(|_| type_mismatch(key, &value, "a string"))
}

fn extract_strings(dict_options: &Bound<'_, PyDict>, key: &str) -> PyResult<Option<Vec<String>>> {
    let Some(value) = get_option(dict_options, key)? else {
        return Ok(None);
    };
    value
        .extract::<Vec<String>>()
        .map(Some)
        .map_err(|_| type_mismatch(key, &value, "a list of strings"))
}

fn options_from_dict(dict_options: &Bound<'_, PyDict>) -> PyResult<SpecCompileOptions> {
    let rule_pattern = match extract_string(dict_options, "rule_pattern")? {
        Some(value) => parse_rule_pattern(&value)?,
        None => EnumPatternMode::default(),
    };
    let rule_output_style = match extract_string(dict_options, "output_style")? {
        Some(value) => parse_output_style(&value)?,
        None => EnumOutputStyle::default(),
    };
    let num_workers_max = match get_option(dict_options, "num_workers_max")? {
        Some(value) => Some(
            value
                .extract::<usize>()
                .map_err(|_| type_mismatch("num_workers_max", &value, "a positive integer"))?,
        ),
        None => None,
    };
    let if_dry_run = match get_option(dict_options, "if_dry_run")? {
        Some(value) => value.is_truthy()?,
        None => false,
    };

    Ok(SpecCompileOptions {
        source_directory: extract_directory(dict_options, "source_directory")?,
        destination_directory: extract_directory(dict_options, "destination_directory")?,
        output_extension: extract_string(dict_options, "output_extension")?,
        extensions: extract_strings(dict_options, "extensions")?,
        include_paths: extract_strings(dict_options, "include_paths")?
            .map(|l_paths| l_paths.into_iter().map(PathBuf::from).collect()),
        patterns_exclude_files: extract_strings(dict_options, "patterns_exclude_files")?,
        rule_pattern,
        rule_output_style,
        num_workers_max,
        if_dry_run,
    })
}

/// `compile(options)`: compile a style-source tree into a mirrored CSS tree.
///
/// `options` is a dict with `source_directory`, `destination_directory` and the
/// optional `output_extension`, `extensions`, `include_paths`,
/// `patterns_exclude_files`, `rule_pattern`, `output_style`, `num_workers_max`,
/// `if_dry_run` keys.
#[pyfunction(name = "compile")]
#[pyo3(signature = (options = None, *, compiler = C_RENDERER_PROGRAM_DEFAULT, compiler_args = None))]
fn compile_py(
    py: Python<'_>,
    options: Option<&Bound<'_, PyAny>>,
    compiler: &str,
    compiler_args: Option<Vec<String>>,
) -> PyResult<PyReportCompile> {
    let spec_options = match options.filter(|v| !v.is_none()) {
        None => None,
        Some(value) => {
            let dict_options = value
                .downcast::<PyDict>()
                .map_err(|_| type_mismatch("options", value, "a dict"))?;
            Some(options_from_dict(dict_options)?)
        }
    };

    let renderer = SpecCommandRenderer {
        program: PathBuf::from(compiler),
        args_extra: compiler_args.unwrap_or_default(),
    };

    let report_compile = py.allow_threads(|| compile_tree(spec_options, &renderer));
    let report_compile = report_compile.map_err(map_compile_tree_error)?;
    Ok(PyReportCompile::from(report_compile))
}

#[pymodule]
fn _sasstree_compile_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyReportCompile>()?;
    module.add_function(wrap_pyfunction!(compile_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
