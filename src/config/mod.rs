use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

/// Hook names and hook sets
pub mod hooks;
pub use hooks::{Hook, HookName, HookSet};

/// One parsed configuration file
pub mod layer;
pub use layer::{ConfigLayer, REPEAT_VARIABLE, RETRY_VARIABLE};

/// Merging traits and utilities
pub mod merge;
pub use merge::Merge;


/// Reserved file name holding a directory's configuration
pub const CONFIG_FILE_NAME: &str = "benchy.yml";

pub const DEFAULT_REPEAT: u32 = 5;
pub const DEFAULT_RETRY: u32 = 3;

/// Configuration in effect for one directory
///
/// Values are never mutated in place: [`resolve`] returns a new value layered over
/// its base, so a group's overrides disappear once the traversal leaves the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Repetitions per benchmark
    pub repeat: u32,
    /// Attempts per repetition
    pub retry: u32,
    pub hooks: HookSet,
    /// Extra environment for every hook process
    pub env: BTreeMap<String, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            repeat: DEFAULT_REPEAT,
            retry: DEFAULT_RETRY,
            hooks: HookSet::default(),
            env: BTreeMap::new(),
        }
    }
}

impl Configuration {
    /// Attempts made per repetition; a retry budget of zero still runs once
    pub fn attempts(&self) -> u32 {
        self.retry.max(1)
    }
}

/// Layer the configuration file of `dir`, if any, over `base`
pub fn resolve(base: &Configuration, dir: &Path) -> Result<Configuration> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        debug!("No configuration in {}", dir.display());
        return Ok(base.clone());
    }

    let layer = ConfigLayer::load(&path)?;
    let resolved = base.merge(&layer)?;
    info!(
        "Loaded configuration {} (repeat={}, retry={}, hooks: {})",
        path.display(),
        resolved.repeat,
        resolved.retry,
        resolved
            .hooks
            .defined()
            .iter()
            .map(HookName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(resolved)
}
