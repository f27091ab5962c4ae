use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;

use crate::benchmarks::hook_runner::{HookArgs, HookRunner};
use crate::config::{Configuration, HookName};
use crate::results::{BenchmarkRow, SampleAggregator};

/// The group a file is processed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupContext {
    pub suite: String,
    pub group: String,
    /// Directory holding the group's benchmark files
    pub source_dir: PathBuf,
    /// Directory receiving the group's reports and CSV
    pub results_dir: PathBuf,
}

impl GroupContext {
    pub fn hook_args(&self) -> HookArgs {
        HookArgs::group(&self.suite, &self.group, &self.source_dir, &self.results_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Benchmark,
    NonBenchmark,
}

/// What happened to one benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkOutcome {
    pub name: String,
    /// Repetitions that produced a report
    pub completed: u32,
    /// Repetitions whose every attempt failed
    pub failed: u32,
    pub row: BenchmarkRow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Benchmark(BenchmarkOutcome),
    NonBenchmark { name: String },
}

/// Runs the files of a group through their hooks
pub struct ExecutionEngine<'a> {
    hooks: &'a HookRunner,
    aggregator: &'a SampleAggregator,
    show_progress: bool,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(
        hooks: &'a HookRunner,
        aggregator: &'a SampleAggregator,
        show_progress: bool,
    ) -> Self {
        Self {
            hooks,
            aggregator,
            show_progress,
        }
    }

    pub fn aggregator(&self) -> &'a SampleAggregator {
        self.aggregator
    }

    /// Decide whether `file` is a benchmark; every file is one unless `is_benchmark` says otherwise
    pub fn classify(
        &self,
        config: &Configuration,
        group: &GroupContext,
        file: &str,
    ) -> Result<FileKind> {
        let args = group.hook_args().with_file(file);
        let kind = match self.hooks.query(config, HookName::IsBenchmark, &args)? {
            Some(false) => FileKind::NonBenchmark,
            Some(true) | None => FileKind::Benchmark,
        };
        debug!("Classified {}/{file} as {kind:?}", group.group);
        Ok(kind)
    }

    /// Classify `file` and run it accordingly
    pub fn process_file(
        &self,
        config: &Configuration,
        group: &GroupContext,
        file: &str,
    ) -> Result<FileOutcome> {
        match self.classify(config, group, file)? {
            FileKind::Benchmark => self
                .run_benchmark(config, group, file)
                .map(FileOutcome::Benchmark),
            FileKind::NonBenchmark => {
                self.run_non_benchmark(config, group, file)?;
                Ok(FileOutcome::NonBenchmark {
                    name: file.to_string(),
                })
            }
        }
    }

    /// Run every repetition of a benchmark and append its aggregate to the group CSV
    pub fn run_benchmark(
        &self,
        config: &Configuration,
        group: &GroupContext,
        file: &str,
    ) -> Result<BenchmarkOutcome> {
        let args = group.hook_args().with_file(file);
        info!("Running benchmark {}/{file}", group.group);

        self.hooks.run_hook(config, HookName::BeforeBenchmark, &args)?;

        let mut completed = 0;
        let mut failed = 0;
        if config.hooks.is_defined(HookName::RunBenchmark) {
            let progress = self.progress_bar(config.repeat, &group.group, file)?;
            for repetition in 1..=config.repeat {
                if self.run_repetition(config, group, &args.with_repetition(repetition))? {
                    completed += 1;
                } else {
                    failed += 1;
                }
                progress.inc(1);
            }
            progress.finish_and_clear();
        } else {
            debug!("No run_benchmark hook, skipping repetitions of {file}");
        }

        self.hooks.run_hook(config, HookName::AfterBenchmark, &args)?;

        let row = self.aggregator.aggregate_benchmark(&group.group, file)?;
        info!(
            "Finished {}/{file}: {completed} of {} repetitions succeeded",
            group.group, config.repeat
        );
        Ok(BenchmarkOutcome {
            name: file.to_string(),
            completed,
            failed,
            row,
        })
    }

    /// One repetition with its retry attempts; returns whether a report was produced
    fn run_repetition(
        &self,
        config: &Configuration,
        group: &GroupContext,
        args: &HookArgs,
    ) -> Result<bool> {
        let (Some(file), Some(repetition)) = (args.file.as_deref(), args.repetition) else {
            anyhow::bail!("Repetition requested without a file and repetition number");
        };
        let report = self
            .aggregator
            .layout()
            .report_path(&group.group, file, repetition);

        self.hooks
            .run_hook(config, HookName::BeforeBenchmarkRepetition, args)?;

        let mut succeeded = false;
        for attempt in 1..=config.attempts() {
            if self.hooks.measure(config, args, &report)? == Some(true) {
                succeeded = true;
                break;
            }
            debug!(
                "Attempt {attempt}/{} of {file} repetition {repetition} failed",
                config.attempts()
            );
        }
        if !succeeded {
            if report.exists() {
                fs::remove_file(&report)?;
            }
            warn!(
                "Repetition {repetition} of {}/{file} failed after {} attempts",
                group.group,
                config.attempts()
            );
        }

        self.hooks
            .run_hook(config, HookName::AfterBenchmarkRepetition, args)?;
        Ok(succeeded)
    }

    /// Run `run_non_benchmark` once, if defined
    pub fn run_non_benchmark(
        &self,
        config: &Configuration,
        group: &GroupContext,
        file: &str,
    ) -> Result<()> {
        debug!("Running non-benchmark {}/{file}", group.group);
        let args = group.hook_args().with_file(file);
        self.hooks
            .run_hook(config, HookName::RunNonBenchmark, &args)
    }

    fn progress_bar(&self, repeat: u32, group: &str, file: &str) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(u64::from(repeat));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")?
                .progress_chars("=> "),
        );
        pb.set_message(format!("{group}/{file}"));
        Ok(pb)
    }
}
