use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{CompileTreeError, EnumPatternMode};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpecFilePatterns {
    pub(crate) patterns_exclude_files: Option<TypePatternSeq>,
}

impl SpecFilePatterns {
    pub(crate) fn from_raw(
        patterns_exclude_files: Option<&[String]>,
        rule_pattern: EnumPatternMode,
    ) -> Result<Self, CompileTreeError> {
        Ok(Self {
            patterns_exclude_files: _compile(patterns_exclude_files, rule_pattern)?,
        })
    }

    /// True when `name_file` hits one of the exclude patterns.
    pub(crate) fn is_excluded(&self, name_file: &str) -> bool {
        let Some(patterns) = self.patterns_exclude_files.as_ref() else {
            return false;
        };
        match patterns {
            TypePatternSeq::Literal(v) => v.iter().any(|p| name_file.contains(p.as_str())),
            TypePatternSeq::Glob(v) => v.iter().any(|p| p.is_match(name_file)),
            TypePatternSeq::Regex(v) => v.iter().any(|p| p.is_match(name_file)),
        }
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumPatternMode,
) -> Result<Option<TypePatternSeq>, CompileTreeError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    match rule_pattern {
        EnumPatternMode::Literal => Ok(Some(TypePatternSeq::Literal(patterns.to_vec()))),
        EnumPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| {
                        CompileTreeError::InvalidArgument(format!(
                            "Invalid pattern in exclude list: {e}"
                        ))
                    })?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypePatternSeq::Glob(l_glob)))
        }
        EnumPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| {
                    CompileTreeError::InvalidArgument(format!(
                        "Invalid pattern in exclude list: {e}"
                    ))
                })?;
                l_regex.push(regex);
            }
            Ok(Some(TypePatternSeq::Regex(l_regex)))
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Strip leading dots and drop repeats, keeping first-seen order.
pub(crate) fn normalize_extensions(extensions: &[String]) -> Result<Vec<String>, String> {
    let mut l_exts: Vec<String> = Vec::with_capacity(extensions.len());
    for c_ext in extensions {
        let c_ext_norm = c_ext.trim().trim_start_matches('.');
        if c_ext_norm.is_empty() {
            return Err(format!("Extension entry must not be empty: `{c_ext}`"));
        }
        if !l_exts.iter().any(|v| v == c_ext_norm) {
            l_exts.push(c_ext_norm.to_string());
        }
    }
    Ok(l_exts)
}

/// True when the final extension of `path` is one of `extensions`.
pub(crate) fn has_matching_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(c_ext) = path.extension().and_then(|v| v.to_str()) else {
        return false;
    };
    extensions.iter().any(|v| v == c_ext)
}

/// `<dst>/<stem>.<output_extension>`; the source extension is replaced, not appended.
pub(crate) fn derive_destination_filepath(
    path_file_src: &Path,
    path_dir_dst: &Path,
    output_extension: &str,
) -> PathBuf {
    let name_stem = path_file_src
        .file_stem()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    path_dir_dst.join(format!("{name_stem}.{output_extension}"))
}

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => 1,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{
        SpecFilePatterns, derive_destination_filepath, has_matching_extension,
        normalize_extensions,
    };
    use crate::spec::{CompileTreeError, EnumPatternMode};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn destination_filepath_replaces_extension() {
        let path_dst =
            derive_destination_filepath(Path::new("src/style.scss"), Path::new("out"), "out");
        assert_eq!(path_dst, PathBuf::from("out/style.out"));
    }

    #[test]
    fn destination_filepath_keeps_inner_dots() {
        let path_dst =
            derive_destination_filepath(Path::new("src/theme.dark.scss"), Path::new("out"), "css");
        assert_eq!(path_dst, PathBuf::from("out/theme.dark.css"));
    }

    #[test]
    fn extensions_are_normalized_and_deduplicated() {
        let l_exts = normalize_extensions(&strings(&[".scss", "sass", "scss"])).expect("valid");
        assert_eq!(l_exts, strings(&["scss", "sass"]));
    }

    #[test]
    fn blank_extension_rejected() {
        assert!(normalize_extensions(&strings(&["scss", " . "])).is_err());
    }

    #[test]
    fn extension_match_is_exact() {
        let l_exts = strings(&["scss"]);
        assert!(has_matching_extension(Path::new("a/b.scss"), &l_exts));
        assert!(!has_matching_extension(Path::new("a/b.xscss"), &l_exts));
        assert!(!has_matching_extension(Path::new("a/b.scss.bak"), &l_exts));
        assert!(!has_matching_extension(Path::new("a/scss"), &l_exts));
    }

    #[test]
    fn glob_exclude_matches_partials() {
        let spec_pats =
            SpecFilePatterns::from_raw(Some(strings(&["_*.scss"]).as_slice()), EnumPatternMode::Glob)
                .expect("valid glob");
        assert!(spec_pats.is_excluded("_mixins.scss"));
        assert!(!spec_pats.is_excluded("main.scss"));
    }

    #[test]
    fn literal_and_regex_excludes() {
        let spec_pats =
            SpecFilePatterns::from_raw(Some(strings(&["draft"]).as_slice()), EnumPatternMode::Literal)
                .expect("literal");
        assert!(spec_pats.is_excluded("page.draft.scss"));

        let spec_pats =
            SpecFilePatterns::from_raw(Some(strings(&[r"^v\d+\.scss$"]).as_slice()), EnumPatternMode::Regex)
                .expect("regex");
        assert!(spec_pats.is_excluded("v2.scss"));
        assert!(!spec_pats.is_excluded("v2x.scss"));
    }

    #[test]
    fn invalid_patterns_rejected() {
        let err = SpecFilePatterns::from_raw(Some(strings(&["["]).as_slice()), EnumPatternMode::Glob)
            .expect_err("invalid glob");
        assert!(matches!(err, CompileTreeError::InvalidArgument(_)));

        let err = SpecFilePatterns::from_raw(Some(strings(&["("]).as_slice()), EnumPatternMode::Regex)
            .expect_err("invalid regex");
        assert!(matches!(err, CompileTreeError::InvalidArgument(_)));
    }
}
