//! Column extraction over results CSVs.
//!
//! A column is chosen by a measurement (`time`, `memory`, `cpu`) and a statistic
//! (`mean`, `median`, `min`). The same specification works on group CSVs, which
//! carry a stddev column per measurement, and on suite CSVs, which do not.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::error::HarnessError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    Time,
    Memory,
    Cpu,
}

impl Measurement {
    pub const ALL: [Measurement; 3] = [Measurement::Time, Measurement::Memory, Measurement::Cpu];

    fn as_str(&self) -> &'static str {
        match self {
            Measurement::Time => "time",
            Measurement::Memory => "memory",
            Measurement::Cpu => "cpu",
        }
    }

    fn offset(&self) -> usize {
        match self {
            Measurement::Time => 0,
            Measurement::Memory => 1,
            Measurement::Cpu => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Mean,
    Median,
    Min,
}

impl Statistic {
    fn as_str(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Min => "min",
        }
    }

    fn offset(&self) -> usize {
        match self {
            Statistic::Mean => 0,
            Statistic::Median => 1,
            Statistic::Min => 2,
        }
    }
}

/// Stddev sits right after min in files that have it
const STDDEV_OFFSET: usize = 3;

/// One column to extract from each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub measurement: Measurement,
    pub statistic: Statistic,
}

impl ColumnSpec {
    /// Parse `measurement[:stat],...`; `all[:stat]` selects every measurement
    pub fn parse_list(spec: &str) -> Result<Vec<ColumnSpec>, HarnessError> {
        let error = |reason: &str| HarnessError::ColumnSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(error("empty column"));
        }

        let mut columns = Vec::new();
        for &part in &parts {
            let (measurement, statistic) = part.split_once(':').unwrap_or((part, "mean"));
            let statistic = match statistic {
                "mean" => Statistic::Mean,
                "median" => Statistic::Median,
                "min" => Statistic::Min,
                _ => return Err(error("statistic must be one of mean, median, min")),
            };
            let measurements: &[Measurement] = match measurement {
                "time" => &[Measurement::Time],
                "memory" => &[Measurement::Memory],
                "cpu" => &[Measurement::Cpu],
                "all" if parts.len() == 1 => &Measurement::ALL,
                "all" => return Err(error("'all' must be the only column")),
                _ => return Err(error("measurement must be one of all, time, memory, cpu")),
            };
            columns.extend(measurements.iter().map(|&measurement| ColumnSpec {
                measurement,
                statistic,
            }));
        }
        Ok(columns)
    }

    fn index(&self, stats_per_measurement: usize) -> usize {
        1 + stats_per_measurement * self.measurement.offset() + self.statistic.offset()
    }
}

/// A value of one row in an extracted column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
}

/// One extracted column of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub file: String,
    /// Header of the extracted column
    pub column: String,
    pub points: Vec<Point>,
}

impl Series {
    fn has_stddev(&self) -> bool {
        self.points.iter().any(|p| p.stddev.is_some())
    }
}

/// Labels are row names cut at the first `.`, so `q1.sql` reads as `q1`
fn short_label(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Extract the requested columns from one results CSV
pub fn extract_series(path: &Path, columns: &[ColumnSpec]) -> Result<Vec<Series>> {
    let corrupt = |reason: String| HarnessError::Csv {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open results file: {path:?}"))?;
    let header = reader
        .headers()
        .with_context(|| format!("Failed to read header of {path:?}"))?
        .clone();

    let has_stddev = header.iter().any(|h| h.to_lowercase().contains("stddev"));
    let stats_per_measurement = if has_stddev { 4 } else { 3 };

    let mut series = Vec::with_capacity(columns.len());
    for column in columns {
        let index = column.index(stats_per_measurement);
        let label = header
            .get(index)
            .ok_or_else(|| corrupt(format!("no column {index} in header")))?;
        let lower = label.to_lowercase();
        if !lower.contains(column.measurement.as_str())
            || !lower.contains(column.statistic.as_str())
        {
            return Err(corrupt(format!("invalid column header '{label}'")).into());
        }
        series.push(Series {
            file: path.display().to_string(),
            column: label.to_string(),
            points: Vec::new(),
        });
    }

    for record in reader.records() {
        let record = record.with_context(|| format!("Failed to read results file: {path:?}"))?;
        if record.is_empty() || record.iter().all(str::is_empty) {
            continue;
        }
        let label = short_label(&record[0]).to_string();

        for (column, series) in columns.iter().zip(series.iter_mut()) {
            let index = column.index(stats_per_measurement);
            let cell = record.get(index).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            let parse = |cell: &str| {
                cell.parse::<f64>()
                    .map_err(|_| corrupt(format!("'{cell}' is not a number")))
            };
            let value = parse(cell)?;
            let stddev = match (has_stddev, column.statistic) {
                (true, Statistic::Mean) => record
                    .get(index + STDDEV_OFFSET)
                    .filter(|s| !s.is_empty())
                    .map(parse)
                    .transpose()?,
                _ => None,
            };
            series.points.push(Point {
                label: label.clone(),
                value,
                stddev,
            });
        }
    }
    Ok(series)
}

/// Write the series side by side as CSV, one row per label
///
/// Rows follow the label order of the first series; labels missing from a series
/// leave an empty cell.
pub fn write_table<W: Write>(series: &[Series], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Benchmark".to_string()];
    for s in series {
        header.push(format!("{}: {}", s.file, s.column));
        if s.has_stddev() {
            header.push(format!("{}: {} stddev", s.file, s.column));
        }
    }
    writer.write_record(&header)?;

    let mut labels: Vec<&str> = Vec::new();
    for s in series {
        for point in &s.points {
            if !labels.contains(&point.label.as_str()) {
                labels.push(&point.label);
            }
        }
    }

    let lookups: Vec<HashMap<&str, &Point>> = series
        .iter()
        .map(|s| s.points.iter().map(|p| (p.label.as_str(), p)).collect())
        .collect();

    for label in labels {
        let mut record = vec![label.to_string()];
        for (s, lookup) in series.iter().zip(&lookups) {
            let point = lookup.get(label);
            record.push(point.map(|p| format!("{:.2}", p.value)).unwrap_or_default());
            if s.has_stddev() {
                record.push(
                    point
                        .and_then(|p| p.stddev)
                        .map(|v| format!("{v:.2}"))
                        .unwrap_or_default(),
                );
            }
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::tables::{rollup_header, BENCHMARK_HEADER};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_column_specs() {
        assert_eq!(
            ColumnSpec::parse_list("time:min,cpu").unwrap(),
            vec![
                ColumnSpec {
                    measurement: Measurement::Time,
                    statistic: Statistic::Min
                },
                ColumnSpec {
                    measurement: Measurement::Cpu,
                    statistic: Statistic::Mean
                },
            ]
        );

        let all = ColumnSpec::parse_list("all:median").unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|c| c.statistic == Statistic::Median));
    }

    #[test]
    fn test_invalid_column_specs() {
        for bad in ["all,time", "disk", "time:max", "time,,cpu"] {
            assert!(
                matches!(
                    ColumnSpec::parse_list(bad),
                    Err(HarnessError::ColumnSpec { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_column_index_depends_on_stddev_columns() {
        let spec = ColumnSpec {
            measurement: Measurement::Cpu,
            statistic: Statistic::Min,
        };
        assert_eq!(spec.index(4), 11);
        assert_eq!(spec.index(3), 9);
        assert_eq!(BENCHMARK_HEADER[11], "Min CPU use (%)");
        assert_eq!(rollup_header("Group")[9], "Min CPU use (%)");
    }

    #[test]
    fn test_extract_group_csv_carries_stddev() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("g.results.csv");
        fs::write(
            &path,
            format!(
                "{}\n{}\n{}\n",
                BENCHMARK_HEADER.join(","),
                "q1.sql,1.50,1.00,0.50,0.25,2,2,2,0,50,50,50,0",
                "q2.sql,,,,,2,2,2,0,50,50,50,0"
            ),
        )
        .unwrap();

        let specs = ColumnSpec::parse_list("time").unwrap();
        let series = extract_series(&path, &specs).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].column, "Mean execution time (s)");
        // The empty cell of q2 is skipped
        assert_eq!(
            series[0].points,
            vec![Point {
                label: "q1".to_string(),
                value: 1.5,
                stddev: Some(0.25)
            }]
        );
    }

    #[test]
    fn test_extract_rejects_mismatched_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Name,A,B,C,D,E,F,G,H,I\nx,1,2,3,4,5,6,7,8,9\n").unwrap();

        let specs = ColumnSpec::parse_list("memory:median").unwrap();
        let err = extract_series(&path, &specs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Csv { .. })
        ));
    }

    #[test]
    fn test_write_table_combines_files() {
        let dir = tempdir().unwrap();
        let header = rollup_header("Group").join(",");
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        fs::write(
            &first,
            format!("{header}\ng1,1,1,1,2,2,2,3,3,3\ng2,4,4,4,5,5,5,6,6,6\n"),
        )
        .unwrap();
        fs::write(&second, format!("{header}\ng2,7,7,7,8,8,8,9,9,9\n")).unwrap();

        let specs = ColumnSpec::parse_list("time:min").unwrap();
        let mut series = extract_series(&first, &specs).unwrap();
        series.extend(extract_series(&second, &specs).unwrap());

        let mut out = Vec::new();
        write_table(&series, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Benchmark,"));
        assert_eq!(lines[1], "g1,1.00,");
        assert_eq!(lines[2], "g2,4.00,7.00");
    }
}
