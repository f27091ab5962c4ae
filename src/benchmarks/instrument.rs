use anyhow::Result;
use log::debug;
use std::fs;
use std::path::Path;

use crate::benchmarks::hook_runner::HookCall;
use crate::config::Hook;

/// Runs the benchmark hook under a resource measurement tool
pub trait Instrument {
    /// Run `hook`, leaving the measurement report at `report` when it succeeds
    ///
    /// Returns whether the measured process exited successfully. No report may be
    /// left behind for a failed attempt.
    fn measure(&self, hook: &Hook, call: &HookCall, report: &Path) -> Result<bool>;
}

/// GNU `time -v`, writing its verbose report to a file
#[derive(Debug, Clone)]
pub struct GnuTime {
    command: String,
}

impl GnuTime {
    pub const DEFAULT_COMMAND: &'static str = "/usr/bin/time";

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn args(&self, hook: &Hook, call: &HookCall, report: &Path) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            "-o".to_string(),
            report.display().to_string(),
            "sh".to_string(),
        ];
        args.extend(call.shell_args(hook));
        args
    }
}

impl Default for GnuTime {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COMMAND)
    }
}

impl Instrument for GnuTime {
    fn measure(&self, hook: &Hook, call: &HookCall, report: &Path) -> Result<bool> {
        let output = call
            .executor()
            .execute_command_with_args(&self.command, &self.args(hook, call, report))?;

        if output.status.success() {
            return Ok(true);
        }
        debug!(
            "Measured command exited with {}, discarding {}",
            output.status,
            report.display()
        );
        if report.exists() {
            fs::remove_file(report)?;
        }
        Ok(false)
    }
}
