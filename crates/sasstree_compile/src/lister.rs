//! Non-recursive directory listing.
//!
//! Both listings are sorted by entry name so traversal order is reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use crate::spec::CompileTreeError;
use crate::util::has_matching_extension;

/// Immediate subdirectories of `path_dir`. Symlinks to directories count as directories.
pub fn list_subdirectories(path_dir: &Path) -> Result<Vec<PathBuf>, CompileTreeError> {
    let mut l_dirs = Vec::new();
    for (path_entry, b_is_dir) in read_entries(path_dir)? {
        if b_is_dir {
            l_dirs.push(path_entry);
        }
    }
    Ok(l_dirs)
}

/// Regular files directly inside `path_dir` whose extension is one of `extensions`.
pub fn list_files_by_extension(
    path_dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, CompileTreeError> {
    let mut l_files = Vec::new();
    for (path_entry, b_is_dir) in read_entries(path_dir)? {
        if !b_is_dir && path_entry.is_file() && has_matching_extension(&path_entry, extensions) {
            l_files.push(path_entry);
        }
    }
    Ok(l_files)
}

fn read_entries(path_dir: &Path) -> Result<Vec<(PathBuf, bool)>, CompileTreeError> {
    let iter_entries = fs::read_dir(path_dir).map_err(|e| CompileTreeError::io(path_dir, e))?;

    let mut l_entries = Vec::new();
    for _entry_res in iter_entries {
        let entry = _entry_res.map_err(|e| CompileTreeError::io(path_dir, e))?;
        let path_entry = entry.path();
        let cfg_file_type = entry
            .file_type()
            .map_err(|e| CompileTreeError::io(&path_entry, e))?;

        let b_is_dir =
            cfg_file_type.is_dir() || (cfg_file_type.is_symlink() && path_entry.is_dir());
        l_entries.push((path_entry, b_is_dir));
    }

    l_entries.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
    Ok(l_entries)
}

#[cfg(test)]
mod tests {
    use super::{list_files_by_extension, list_subdirectories};
    use crate::spec::CompileTreeError;
    use crate::test_support::{TestDir, write_text};

    #[test]
    fn subdirectories_sorted_and_non_recursive() {
        let tmp = TestDir::new();
        let root = tmp.path().join("styles");
        write_text(&root.join("zeta/a.scss"), "");
        write_text(&root.join("alpha/deep/b.scss"), "");
        write_text(&root.join("main.scss"), "");

        let l_dirs = list_subdirectories(&root).expect("list dirs");
        assert_eq!(l_dirs, vec![root.join("alpha"), root.join("zeta")]);
    }

    #[test]
    fn files_filtered_by_extension() {
        let tmp = TestDir::new();
        let root = tmp.path().join("styles");
        write_text(&root.join("b.scss"), "");
        write_text(&root.join("a.sass"), "");
        write_text(&root.join("c.css"), "");
        write_text(&root.join("nested/d.scss"), "");
        std::fs::create_dir_all(root.join("dir.scss")).expect("mkdir");

        let l_files =
            list_files_by_extension(&root, &["scss".to_string(), "sass".to_string()])
                .expect("list files");
        assert_eq!(l_files, vec![root.join("a.sass"), root.join("b.scss")]);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let tmp = TestDir::new();
        let err = list_subdirectories(&tmp.path().join("absent")).expect_err("must fail");
        match err {
            CompileTreeError::Io { path, .. } => assert_eq!(path, tmp.path().join("absent")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_listed() {
        use std::os::unix::fs::symlink;

        let tmp = TestDir::new();
        let root = tmp.path().join("styles");
        write_text(&tmp.path().join("shared/x.scss"), "");
        std::fs::create_dir_all(&root).expect("mkdir");
        symlink(tmp.path().join("shared"), root.join("shared")).expect("symlink");

        let l_dirs = list_subdirectories(&root).expect("list dirs");
        assert_eq!(l_dirs, vec![root.join("shared")]);
    }
}
