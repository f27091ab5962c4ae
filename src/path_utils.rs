use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Prefix of every suite results directory
pub const RESULTS_DIR_PREFIX: &str = "benchy";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Expand environment variables and `~` in a path string
pub fn expand_path_str(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| path.into())
        .into_owned()
}

/// Expand a PathBuf with environment variables
pub fn expand_path_buf(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(expand_path_str(&path_str))
}

/// Create a directory and all parent directories if they don't exist
pub fn ensure_directory(path: &Path) -> Result<(), HarnessError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|source| HarnessError::ResultsDir {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Created directory: {path:?}");
    }
    Ok(())
}

/// Create `<root>/benchy.<suite>.<timestamp>`, never reusing an existing directory
///
/// Two runs started within the same second get a numeric suffix.
pub fn create_suite_results_dir(root: &Path, suite: &str) -> Result<PathBuf, HarnessError> {
    ensure_directory(root)?;
    let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let base = format!("{RESULTS_DIR_PREFIX}.{suite}.{stamp}");

    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{base}.{attempt}")
        };
        let candidate = root.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => {
                debug!("Created results directory: {candidate:?}");
                return Ok(candidate);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => {
                return Err(HarnessError::ResultsDir {
                    path: candidate,
                    source,
                })
            }
        }
    }
}

/// Kind of directory entry to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Names of the entries of `dir` of the given kind, sorted, hidden entries excluded
pub fn list_entries(dir: &Path, kind: EntryKind) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {dir:?}"))? {
        let entry = entry.with_context(|| format!("Failed to read entry in {dir:?}"))?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping non-UTF-8 entry {raw:?} in {dir:?}");
                continue;
            }
        };
        if name.starts_with('.') {
            continue;
        }
        // Follow symlinks so linked benchmarks and groups are picked up
        let path = entry.path();
        let matches = match kind {
            EntryKind::Directory => path.is_dir(),
            EntryKind::File => path.is_file(),
        };
        if matches {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Base name of a directory, resolving `.` and `..` first
pub fn dir_base_name(dir: &Path) -> Result<String> {
    let canonical = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {dir:?}"))?;
    canonical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Path has no base name: {canonical:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_expand_path_str() {
        assert_eq!(expand_path_str("/tmp/test"), "/tmp/test");

        env::set_var("BENCHY_TEST_PATH", "/test/path");
        let result = expand_path_str("$BENCHY_TEST_PATH/file");
        assert!(result.contains("/test/path/file"));
        env::remove_var("BENCHY_TEST_PATH");

        if let Ok(home) = env::var("HOME") {
            let result = expand_path_str("~/file");
            assert!(result.contains(&format!("{}/file", home)));
        }
    }

    #[test]
    #[serial]
    fn test_expand_path_buf() {
        assert_eq!(
            expand_path_buf(Path::new("/tmp/test")),
            PathBuf::from("/tmp/test")
        );

        env::set_var("BENCHY_TEST_PATH", "/test/path");
        let result = expand_path_buf(Path::new("$BENCHY_TEST_PATH/file"));
        assert!(result.to_string_lossy().contains("/test/path/file"));
        env::remove_var("BENCHY_TEST_PATH");
    }

    #[test]
    fn test_ensure_directory() {
        let tempdir = tempdir().unwrap();
        let test_dir = tempdir.path().join("test_dir");
        let nested_dir = test_dir.join("nested").join("path");

        ensure_directory(&test_dir).unwrap();
        assert!(test_dir.is_dir());

        ensure_directory(&nested_dir).unwrap();
        assert!(nested_dir.is_dir());

        // Existing dir
        ensure_directory(&test_dir).unwrap();
        assert!(test_dir.exists());
    }

    #[test]
    fn test_ensure_directory_under_a_file_fails() {
        let tempdir = tempdir().unwrap();
        let file = tempdir.path().join("plain");
        fs::write(&file, "x").unwrap();

        let err = ensure_directory(&file.join("sub")).unwrap_err();
        assert!(matches!(err, HarnessError::ResultsDir { .. }));
    }

    #[test]
    fn test_suite_results_dirs_are_unique() {
        let tempdir = tempdir().unwrap();

        let first = create_suite_results_dir(tempdir.path(), "tpch").unwrap();
        let second = create_suite_results_dir(tempdir.path(), "tpch").unwrap();

        assert_ne!(first, second);
        assert!(first.is_dir());
        assert!(second.is_dir());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("benchy.tpch."), "unexpected name {name}");
    }

    #[test]
    fn test_list_entries_sorted_and_filtered() {
        let tempdir = tempdir().unwrap();
        let root = tempdir.path();
        fs::create_dir(root.join("b-group")).unwrap();
        fs::create_dir(root.join("a-group")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join("z.sql"), "").unwrap();
        fs::write(root.join("c.sql"), "").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();

        assert_eq!(
            list_entries(root, EntryKind::Directory).unwrap(),
            vec!["a-group", "b-group"]
        );
        assert_eq!(
            list_entries(root, EntryKind::File).unwrap(),
            vec!["c.sql", "z.sql"]
        );
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_list_entries_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tempdir = tempdir().unwrap();
        let root = tempdir.path();
        fs::write(root.join(OsStr::from_bytes(b"bad\xff.sql")), "").unwrap();
        fs::write(root.join("q1.sql"), "").unwrap();

        assert_eq!(list_entries(root, EntryKind::File).unwrap(), vec!["q1.sql"]);
    }

    #[test]
    fn test_dir_base_name_resolves_relative_components() {
        let tempdir = tempdir().unwrap();
        let suite = tempdir.path().join("my-suite");
        fs::create_dir_all(suite.join("group")).unwrap();

        assert_eq!(dir_base_name(&suite.join("group").join("..")).unwrap(), "my-suite");
    }
}
