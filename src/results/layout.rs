use std::path::{Path, PathBuf};

use crate::error::HarnessError;
use crate::path_utils;

/// File locations inside one suite results directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsLayout {
    /// `<results_root>/benchy.<suite>.<timestamp>`
    pub root: PathBuf,
    pub suite: String,
}

impl ResultsLayout {
    /// Allocate a fresh, uniquely named results directory for `suite` under `results_root`
    pub fn create(results_root: &Path, suite: &str) -> Result<Self, HarnessError> {
        let root = path_utils::create_suite_results_dir(results_root, suite)?;
        Ok(Self {
            root,
            suite: suite.to_string(),
        })
    }

    /// Use an existing directory as the suite results directory
    pub fn at(root: impl Into<PathBuf>, suite: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suite: suite.into(),
        }
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.root.join(group)
    }

    /// Create the group's results directory if it does not exist yet
    pub fn ensure_group_dir(&self, group: &str) -> Result<PathBuf, HarnessError> {
        let dir = self.group_dir(group);
        path_utils::ensure_directory(&dir)?;
        Ok(dir)
    }

    /// Raw instrumentation report of one repetition
    pub fn report_path(&self, group: &str, benchmark: &str, repetition: u32) -> PathBuf {
        self.group_dir(group)
            .join(format!("{benchmark}-{repetition}.result"))
    }

    pub fn group_csv(&self, group: &str) -> PathBuf {
        self.group_dir(group).join(format!("{group}.results.csv"))
    }

    pub fn suite_csv(&self) -> PathBuf {
        self.root.join(format!("{}.results.csv", self.suite))
    }

    pub fn total_csv(&self) -> PathBuf {
        self.root.join(format!("{}.total_results.csv", self.suite))
    }

    pub fn system_info(&self) -> PathBuf {
        self.root.join("system_info")
    }
}

/// Repetition number of `file_name` if it is a report of `benchmark`
pub fn report_repetition(file_name: &str, benchmark: &str) -> Option<u32> {
    file_name
        .strip_prefix(benchmark)?
        .strip_prefix('-')?
        .strip_suffix(".result")?
        .parse()
        .ok()
}
