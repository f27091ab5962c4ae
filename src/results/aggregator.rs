use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;

use crate::results::layout::{report_repetition, ResultsLayout};
use crate::results::report::MeasurementSample;
use crate::results::stats::SampleSet;
use crate::results::tables::{
    append_record, overwrite_record, read_rollups, rollup_header, BenchmarkRow, RollupRow,
    TableKind, BENCHMARK_HEADER,
};

/// Reduces instrumentation reports into the benchmark, group, suite and total CSVs
pub struct SampleAggregator {
    layout: ResultsLayout,
}

impl SampleAggregator {
    pub fn new(layout: ResultsLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ResultsLayout {
        &self.layout
    }

    /// Read every report of `benchmark` in the group results directory
    ///
    /// Reports that cannot be parsed are skipped with a warning.
    pub fn collect_samples(&self, group: &str, benchmark: &str) -> Result<Vec<MeasurementSample>> {
        let dir = self.layout.group_dir(group);
        let mut reports = Vec::new();
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to read directory: {dir:?}"))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to read entry in {dir:?}"))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(repetition) = report_repetition(&name, benchmark) {
                reports.push((repetition, entry.path()));
            }
        }
        reports.sort();

        let mut samples = Vec::with_capacity(reports.len());
        for (repetition, path) in reports {
            match MeasurementSample::from_report(&path) {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!("Skipping repetition {repetition} of {benchmark}: {e}"),
            }
        }
        Ok(samples)
    }

    /// Summarize one benchmark's reports and append its row to the group CSV
    pub fn aggregate_benchmark(&self, group: &str, benchmark: &str) -> Result<BenchmarkRow> {
        let samples = self.collect_samples(group, benchmark)?;
        if samples.is_empty() {
            warn!("No successful repetitions for {group}/{benchmark}, recording zeros");
        }

        let time: SampleSet = samples.iter().map(|s| s.elapsed_seconds).collect();
        let memory: SampleSet = samples.iter().map(|s| s.peak_memory_mb).collect();
        let cpu: SampleSet = samples.iter().map(|s| s.cpu_percent).collect();

        let row = BenchmarkRow {
            benchmark: benchmark.to_string(),
            samples: samples.len(),
            time: time.summarize(),
            memory: memory.summarize(),
            cpu: cpu.summarize(),
        };

        append_record(&self.layout.group_csv(group), &BENCHMARK_HEADER, &row.record())?;
        Ok(row)
    }

    /// Sum the group's benchmark rows into one suite CSV row
    ///
    /// Returns `None` when the group produced no benchmark rows.
    pub fn aggregate_group(&self, group: &str) -> Result<Option<RollupRow>> {
        let group_csv = self.layout.group_csv(group);
        if !group_csv.exists() {
            info!("Group {group} has no benchmark results to roll up");
            return Ok(None);
        }

        let mut total = RollupRow::new(group);
        for row in read_rollups(&group_csv, TableKind::Benchmarks)? {
            total.add(&row);
        }

        append_record(
            &self.layout.suite_csv(),
            &rollup_header("Group"),
            &total.record(),
        )?;
        Ok(Some(total))
    }

    /// Sum the suite CSV into the total CSV, replacing any previous total
    pub fn aggregate_total(&self) -> Result<RollupRow> {
        let suite_csv = self.layout.suite_csv();
        let mut total = RollupRow::new(self.layout.suite.clone());
        if suite_csv.exists() {
            for row in read_rollups(&suite_csv, TableKind::Rollups)? {
                total.add(&row);
            }
        } else {
            warn!("Suite {} produced no group results", self.layout.suite);
        }

        overwrite_record(
            &self.layout.total_csv(),
            &rollup_header("Suite"),
            &total.record(),
        )?;
        Ok(total)
    }
}
