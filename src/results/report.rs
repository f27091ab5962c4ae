use std::path::Path;

use crate::error::HarnessError;

pub const ELAPSED_MARKER: &str = "Elapsed (wall clock)";
pub const MEMORY_MARKER: &str = "Maximum resident set size";
pub const CPU_MARKER: &str = "Percent of CPU";

/// Measurements taken from one repetition's instrumentation report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSample {
    pub elapsed_seconds: f64,
    pub peak_memory_mb: f64,
    pub cpu_percent: f64,
}

impl MeasurementSample {
    /// Read and parse a report written by `time -v`
    pub fn from_report(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::Report {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, HarnessError> {
        let malformed = |reason: String| HarnessError::Report {
            path: path.to_path_buf(),
            reason,
        };

        let field = |marker: &str| {
            text.lines()
                .find(|line| line.contains(marker))
                .and_then(|line| line.split_whitespace().last())
                .ok_or_else(|| malformed(format!("missing '{marker}' line")))
        };

        let elapsed = field(ELAPSED_MARKER)?;
        let elapsed_seconds = parse_elapsed(elapsed)
            .ok_or_else(|| malformed(format!("unparsable elapsed time '{elapsed}'")))?;

        let memory = field(MEMORY_MARKER)?;
        // Reported in kilobytes
        let peak_memory_mb = memory
            .parse::<f64>()
            .map(|kb| kb / 1000.0)
            .map_err(|_| malformed(format!("unparsable memory '{memory}'")))?;

        let cpu = field(CPU_MARKER)?;
        let cpu_percent = parse_cpu(cpu)
            .ok_or_else(|| malformed(format!("unparsable CPU percentage '{cpu}'")))?;

        Ok(Self {
            elapsed_seconds,
            peak_memory_mb,
            cpu_percent,
        })
    }
}

/// Convert `H:MM:SS(.ff)` or `M:SS(.ff)` to seconds
pub fn parse_elapsed(value: &str) -> Option<f64> {
    let parts: Vec<&str> = value.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s),
        _ => return None,
    };
    let seconds = seconds.parse::<f64>().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// `time` prints `?%` when the elapsed time is too short to measure
fn parse_cpu(value: &str) -> Option<f64> {
    let value = value.strip_suffix('%').unwrap_or(value);
    if value == "?" {
        return Some(0.0);
    }
    value.parse::<f64>().ok()
}
