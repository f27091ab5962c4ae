use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;

use crate::error::HarnessError;
use crate::results::stats::{Aggregate, Rollup};

/// Header of a group's per-benchmark CSV
pub const BENCHMARK_HEADER: [&str; 13] = [
    "Benchmark",
    "Mean execution time (s)",
    "Median execution time (s)",
    "Min execution time (s)",
    "Stddev time",
    "Mean memory use (MB)",
    "Median memory use (MB)",
    "Min memory use (MB)",
    "Stddev memory use",
    "Mean CPU use (%)",
    "Median CPU use (%)",
    "Min CPU use (%)",
    "Stddev CPU use",
];

/// Value columns of the suite and total CSVs
pub const ROLLUP_COLUMNS: [&str; 9] = [
    "Mean execution time (s)",
    "Median execution time (s)",
    "Min execution time (s)",
    "Mean memory use (MB)",
    "Median memory use (MB)",
    "Min memory use (MB)",
    "Mean CPU use (%)",
    "Median CPU use (%)",
    "Min CPU use (%)",
];

/// Mean/median/min column indexes of each metric in a benchmark row
const BENCHMARK_ROLLUP_INDEXES: [[usize; 3]; 3] = [[1, 2, 3], [5, 6, 7], [9, 10, 11]];
const ROLLUP_INDEXES: [[usize; 3]; 3] = [[1, 2, 3], [4, 5, 6], [7, 8, 9]];

fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

/// One line of a group CSV
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRow {
    pub benchmark: String,
    /// Number of reports the row was computed from
    pub samples: usize,
    pub time: Aggregate,
    pub memory: Aggregate,
    pub cpu: Aggregate,
}

impl BenchmarkRow {
    pub fn record(&self) -> Vec<String> {
        let mut record = vec![self.benchmark.clone()];
        for metric in [&self.time, &self.memory, &self.cpu] {
            record.extend(
                [metric.mean, metric.median, metric.min, metric.stddev]
                    .into_iter()
                    .map(format_value),
            );
        }
        record
    }
}

/// One line of a suite or total CSV
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollupRow {
    pub name: String,
    pub time: Rollup,
    pub memory: Rollup,
    pub cpu: Rollup,
}

impl RollupRow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, other: &RollupRow) {
        self.time.add(&other.time);
        self.memory.add(&other.memory);
        self.cpu.add(&other.cpu);
    }

    pub fn record(&self) -> Vec<String> {
        let mut record = vec![self.name.clone()];
        for metric in [&self.time, &self.memory, &self.cpu] {
            record.extend(
                [metric.mean, metric.median, metric.min]
                    .into_iter()
                    .map(format_value),
            );
        }
        record
    }
}

/// Header of a rollup CSV whose rows are named by `first_column`
pub fn rollup_header(first_column: &str) -> Vec<&str> {
    std::iter::once(first_column)
        .chain(ROLLUP_COLUMNS.iter().copied())
        .collect()
}

/// Append `record` to the CSV at `path`, writing `header` first if the file is new
pub fn append_record<H, R>(path: &Path, header: &[H], record: &[R]) -> Result<()>
where
    H: AsRef<[u8]>,
    R: AsRef<[u8]>,
{
    let is_new = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open results file: {path:?}"))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer.write_record(header)?;
    }
    writer.write_record(record)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write results file: {path:?}"))?;
    Ok(())
}

/// Replace the CSV at `path` with a header and a single record
pub fn overwrite_record<H, R>(path: &Path, header: &[H], record: &[R]) -> Result<()>
where
    H: AsRef<[u8]>,
    R: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create results file: {path:?}"))?;
    writer.write_record(header)?;
    writer.write_record(record)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write results file: {path:?}"))?;
    Ok(())
}

/// Which kind of CSV a rollup is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// A group CSV, with stddev columns
    Benchmarks,
    /// A suite CSV, without stddev columns
    Rollups,
}

impl TableKind {
    fn indexes(&self) -> &'static [[usize; 3]; 3] {
        match self {
            TableKind::Benchmarks => &BENCHMARK_ROLLUP_INDEXES,
            TableKind::Rollups => &ROLLUP_INDEXES,
        }
    }

    fn width(&self) -> usize {
        match self {
            TableKind::Benchmarks => BENCHMARK_HEADER.len(),
            TableKind::Rollups => ROLLUP_COLUMNS.len() + 1,
        }
    }
}

/// Read every data row of a results CSV, keeping only mean/median/min
pub fn read_rollups(path: &Path, kind: TableKind) -> Result<Vec<RollupRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open results file: {path:?}"))?;

    let malformed = |reason: String| HarnessError::Csv {
        path: path.to_path_buf(),
        reason,
    };

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read results file: {path:?}"))?;
        if record.len() != kind.width() {
            return Err(malformed(format!(
                "row {} has {} columns, expected {}",
                line + 1,
                record.len(),
                kind.width()
            ))
            .into());
        }

        let value = |index: usize| -> Result<f64, HarnessError> {
            let cell = &record[index];
            cell.trim().parse::<f64>().map_err(|_| {
                malformed(format!("row {} column {}: '{cell}' is not a number", line + 1, index))
            })
        };
        let rollup = |[mean, median, min]: [usize; 3]| -> Result<Rollup, HarnessError> {
            Ok(Rollup {
                mean: value(mean)?,
                median: value(median)?,
                min: value(min)?,
            })
        };

        let [time, memory, cpu] = *kind.indexes();
        rows.push(RollupRow {
            name: record[0].to_string(),
            time: rollup(time)?,
            memory: rollup(memory)?,
            cpu: rollup(cpu)?,
        });
    }
    Ok(rows)
}
