use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::benchmarks::engine::{ExecutionEngine, FileOutcome, GroupContext};
use crate::benchmarks::hook_runner::{HookArgs, HookRunner};
use crate::config::{self, Configuration, HookName, CONFIG_FILE_NAME};
use crate::path_utils::{self, EntryKind, RESULTS_DIR_PREFIX};
use crate::results::{ResultsLayout, RollupRow, SampleAggregator};

/// Options of one `run` invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory under which the suite results directory is created
    pub results_root: PathBuf,
    pub show_progress: bool,
    /// Write `system_info` into the results directory
    pub system_info: bool,
}

/// Summary of a finished group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub name: String,
    pub files: Vec<FileOutcome>,
    /// Suite CSV row, if the group produced benchmark rows
    pub rollup: Option<RollupRow>,
}

/// Summary of a finished suite
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteReport {
    pub suite: String,
    pub results_dir: PathBuf,
    pub groups: Vec<GroupReport>,
    pub total: RollupRow,
}

/// Walks a suite's groups and files, mirroring them into a results directory
///
/// The configuration in effect is passed down explicitly: each group resolves its own
/// layer over the suite configuration, so nothing a group sets leaks into the next one.
pub struct SuiteRunner {
    hooks: HookRunner,
    options: RunOptions,
}

impl SuiteRunner {
    pub fn new(hooks: HookRunner, options: RunOptions) -> Self {
        Self { hooks, options }
    }

    /// Run every group of the suite at `suite_path`
    pub fn run_suite(&self, suite_path: &Path) -> Result<SuiteReport> {
        let suite_dir = suite_path
            .canonicalize()
            .with_context(|| format!("Suite directory not found: {suite_path:?}"))?;
        if !suite_dir.is_dir() {
            anyhow::bail!("Suite path is not a directory: {suite_dir:?}");
        }
        let suite = path_utils::dir_base_name(&suite_dir)?;

        path_utils::ensure_directory(&self.options.results_root)?;
        let results_root = self
            .options
            .results_root
            .canonicalize()
            .with_context(|| format!("Failed to resolve {:?}", self.options.results_root))?;
        let layout = ResultsLayout::create(&results_root, &suite)?;
        info!("Running suite {suite}, results in {}", layout.root.display());

        if self.options.system_info {
            if let Err(e) = crate::system_info::dump_sys_info(&layout.system_info()) {
                warn!("Could not write system info: {e:#}");
            }
        }

        let suite_config = config::resolve(&Configuration::default(), &suite_dir)?;
        let suite_args = HookArgs::suite(&suite, &suite_dir, &layout.root);
        self.hooks
            .run_hook(&suite_config, HookName::BeforeSuite, &suite_args)?;

        let aggregator = SampleAggregator::new(layout.clone());
        let engine = ExecutionEngine::new(&self.hooks, &aggregator, self.options.show_progress);

        let mut groups = Vec::new();
        for group in path_utils::list_entries(&suite_dir, EntryKind::Directory)? {
            if is_results_dir(&suite_dir.join(&group), &group, &suite, &layout) {
                debug!("Skipping results directory {group}");
                continue;
            }
            groups.push(self.run_group(&engine, &suite_config, &suite_dir, &suite, &group)?);
        }

        self.hooks
            .run_hook(&suite_config, HookName::AfterSuite, &suite_args)?;
        let total = aggregator.aggregate_total()?;
        info!(
            "Finished suite {suite}: {} groups, results in {}",
            groups.len(),
            layout.root.display()
        );

        Ok(SuiteReport {
            suite,
            results_dir: layout.root,
            groups,
            total,
        })
    }

    fn run_group(
        &self,
        engine: &ExecutionEngine<'_>,
        suite_config: &Configuration,
        suite_dir: &Path,
        suite: &str,
        group: &str,
    ) -> Result<GroupReport> {
        let source_dir = suite_dir.join(group);
        let context = GroupContext {
            suite: suite.to_string(),
            group: group.to_string(),
            results_dir: engine.aggregator().layout().ensure_group_dir(group)?,
            source_dir,
        };
        let config = config::resolve(suite_config, &context.source_dir)?;
        info!(
            "Entering group {group} (repeat={}, retry={})",
            config.repeat, config.retry
        );

        let args = context.hook_args();
        self.hooks.run_hook(&config, HookName::BeforeGroup, &args)?;

        let mut files = Vec::new();
        for file in path_utils::list_entries(&context.source_dir, EntryKind::File)? {
            if file == CONFIG_FILE_NAME {
                continue;
            }
            files.push(engine.process_file(&config, &context, &file)?);
        }

        self.hooks.run_hook(&config, HookName::AfterGroup, &args)?;
        let rollup = engine.aggregator().aggregate_group(group)?;
        info!("Finished group {group}: {} files", files.len());

        Ok(GroupReport {
            name: group.to_string(),
            files,
            rollup,
        })
    }
}

/// Results directories of this suite, or directories holding them, may live inside the suite
fn is_results_dir(path: &Path, name: &str, suite: &str, layout: &ResultsLayout) -> bool {
    layout.root.starts_with(path)
        || name.starts_with(&format!("{RESULTS_DIR_PREFIX}.{suite}."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_dirs_are_recognised() {
        let layout = ResultsLayout::at("/suite/benchy.suite.2024-01-01_00-00-00", "suite");

        assert!(is_results_dir(
            Path::new("/suite/benchy.suite.2024-01-01_00-00-00"),
            "benchy.suite.2024-01-01_00-00-00",
            "suite",
            &layout
        ));
        assert!(is_results_dir(
            Path::new("/suite/benchy.suite.2023-12-31_23-59-59.1"),
            "benchy.suite.2023-12-31_23-59-59.1",
            "suite",
            &layout
        ));
        assert!(!is_results_dir(Path::new("/suite/g1"), "g1", "suite", &layout));
        assert!(!is_results_dir(Path::new("/suite/benchy"), "benchy", "suite", &layout));

        let nested = ResultsLayout::at(
            "/suite/results/benchy.suite.2024-01-01_00-00-00",
            "suite",
        );
        assert!(is_results_dir(
            Path::new("/suite/results"),
            "results",
            "suite",
            &nested
        ));
        assert!(!is_results_dir(
            Path::new("/suite/benchy.other.x"),
            "benchy.other.x",
            "suite",
            &layout
        ));
    }
}
