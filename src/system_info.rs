use anyhow::{Context, Result};
use log::info;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use sysinfo::System;

const UNKNOWN: &str = "<unknown>";
const SECONDS_PER_DAY: u64 = 86_400;

/// Host description stored next to a suite's results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub os_name: String,
    pub kernel_version: String,
    pub os_version: String,
    pub host_name: String,
    pub cpu_arch: String,
    /// Brand of the first CPU, if any were reported
    pub cpu_brand: Option<String>,
    pub cpu_count: usize,
    pub cpu_frequency_mhz: u64,
    pub total_memory_bytes: u64,
    pub total_swap_bytes: u64,
    pub uptime_seconds: u64,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let cpus = sys.cpus();

        Self {
            os_name: System::name().unwrap_or_else(|| UNKNOWN.to_owned()),
            kernel_version: System::kernel_version().unwrap_or_else(|| UNKNOWN.to_owned()),
            os_version: System::long_os_version().unwrap_or_else(|| UNKNOWN.to_owned()),
            host_name: System::host_name().unwrap_or_else(|| UNKNOWN.to_owned()),
            cpu_arch: System::cpu_arch(),
            cpu_brand: cpus.first().map(|cpu| cpu.brand().trim().to_string()),
            cpu_count: cpus.len(),
            cpu_frequency_mhz: cpus.first().map(|cpu| cpu.frequency()).unwrap_or(0),
            total_memory_bytes: sys.total_memory(),
            total_swap_bytes: sys.total_swap(),
            uptime_seconds: System::uptime(),
        }
    }

    /// One aligned `label: value` line per field
    pub fn render(&self) -> String {
        let cpu = match &self.cpu_brand {
            Some(brand) => format!(
                "{brand} ({} cores) @ {:.2} GHz",
                self.cpu_count,
                self.cpu_frequency_mhz as f64 / 1000.0
            ),
            None => "Unknown".to_string(),
        };
        let lines = [
            ("System name:", self.os_name.clone()),
            ("Kernel version:", self.kernel_version.clone()),
            ("OS version:", self.os_version.clone()),
            ("Host name:", self.host_name.clone()),
            ("CPU arch:", self.cpu_arch.clone()),
            ("CPU:", cpu),
            ("Total memory:", format!("{} bytes", self.total_memory_bytes)),
            ("Total swap:", format!("{} bytes", self.total_swap_bytes)),
            ("Uptime (seconds):", self.uptime_seconds.to_string()),
            ("Uptime (days):", (self.uptime_seconds / SECONDS_PER_DAY).to_string()),
        ];

        let mut out = String::new();
        for (label, value) in lines {
            let _ = writeln!(out, "{label:<20}{value}");
        }
        out
    }
}

/// Describe the host in `path`
pub fn dump_sys_info(path: &Path) -> Result<()> {
    info!("Writing system info to {path:?}");
    fs::write(path, SystemInfo::collect().render())
        .with_context(|| format!("Failed to write system info: {path:?}"))
}
