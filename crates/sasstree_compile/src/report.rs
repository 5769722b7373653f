//! Compile report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Aggregate counters for one successful `compile_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCompile {
    /// Directories walked, including the source root.
    pub cnt_dirs_visited: u64,
    /// Files whose extension matched.
    pub cnt_files_matched: u64,
    /// Files rendered and written.
    pub cnt_files_compiled: u64,
    /// Matched files not written because of dry-run.
    pub cnt_files_skipped: u64,
    /// Matched files dropped by exclude patterns.
    pub cnt_files_excluded: u64,
    /// Destination files in traversal order (planned paths on dry-run).
    pub l_outputs: Vec<PathBuf>,
}

impl ReportCompile {
    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_visited".to_string(), self.cnt_dirs_visited);
        dict_counts.insert("cnt_files_matched".to_string(), self.cnt_files_matched);
        dict_counts.insert("cnt_files_compiled".to_string(), self.cnt_files_compiled);
        dict_counts.insert("cnt_files_skipped".to_string(), self.cnt_files_skipped);
        dict_counts.insert("cnt_files_excluded".to_string(), self.cnt_files_excluded);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs={} matched={} compiled={} skipped={} excluded={}",
            self.cnt_dirs_visited,
            self.cnt_files_matched,
            self.cnt_files_compiled,
            self.cnt_files_skipped,
            self.cnt_files_excluded
        )
    }
}

impl fmt::Display for ReportCompile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SASS]"))
    }
}

/// Mutable accumulator threaded through the walk.
#[derive(Debug, Default, Clone)]
pub struct ReportCompileBuilder {
    cnt_dirs_visited: u64,
    cnt_files_matched: u64,
    cnt_files_compiled: u64,
    cnt_files_skipped: u64,
    cnt_files_excluded: u64,
    l_outputs: Vec<PathBuf>,
}

impl ReportCompileBuilder {
    pub fn add_dir_visited(&mut self) {
        self.cnt_dirs_visited += 1;
    }

    pub fn add_matched(&mut self, value: u64) {
        self.cnt_files_matched += value;
    }

    pub fn add_excluded(&mut self) {
        self.cnt_files_excluded += 1;
    }

    pub fn add_compiled(&mut self, path_file_dst: PathBuf) {
        self.cnt_files_compiled += 1;
        self.l_outputs.push(path_file_dst);
    }

    pub fn add_skipped(&mut self, path_file_dst: PathBuf) {
        self.cnt_files_skipped += 1;
        self.l_outputs.push(path_file_dst);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCompile {
        ReportCompile {
            cnt_dirs_visited: self.cnt_dirs_visited,
            cnt_files_matched: self.cnt_files_matched,
            cnt_files_compiled: self.cnt_files_compiled,
            cnt_files_skipped: self.cnt_files_skipped,
            cnt_files_excluded: self.cnt_files_excluded,
            l_outputs: self.l_outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportCompile, ReportCompileBuilder};

    #[test]
    fn report_to_dict_and_format() {
        let report = ReportCompile {
            cnt_dirs_visited: 3,
            cnt_files_matched: 5,
            cnt_files_compiled: 4,
            cnt_files_skipped: 0,
            cnt_files_excluded: 1,
            l_outputs: vec![],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_dirs_visited"], 3);
        assert_eq!(dict_counts["cnt_files_compiled"], 4);
        assert_eq!(dict_counts["cnt_files_excluded"], 1);

        let txt = report.format("[SASS]");
        assert_eq!(txt, "[SASS] dirs=3 matched=5 compiled=4 skipped=0 excluded=1");
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_keeps_output_order() {
        let mut builder = ReportCompileBuilder::default();
        builder.add_dir_visited();
        builder.add_matched(2);
        builder.add_compiled(PathBuf::from("out/a.css"));
        builder.add_skipped(PathBuf::from("out/b.css"));

        let report = builder.build();
        assert_eq!(report.cnt_files_compiled, 1);
        assert_eq!(report.cnt_files_skipped, 1);
        assert_eq!(
            report.l_outputs,
            vec![PathBuf::from("out/a.css"), PathBuf::from("out/b.css")]
        );
    }
}
