use std::path::PathBuf;
use thiserror::Error;

/// Failures with a defined meaning for a benchmark run.
///
/// Configuration and results-directory errors abort the run. Report errors are
/// recoverable: the affected repetition is left out of the aggregate.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A numeric variable did not hold an unsigned integer
    #[error("{path}: {name} must be an unsigned integer, got {value}")]
    Config {
        path: PathBuf,
        name: String,
        value: String,
    },

    #[error("{path}: unknown hook '{name}'")]
    UnknownHook { path: PathBuf, name: String },

    #[error("{path}: unknown configuration key '{key}'")]
    UnknownKey { path: PathBuf, key: String },

    #[error("{path}: failed to parse configuration: {source}")]
    ConfigSyntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to create results directory {path}: {source}")]
    ResultsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An instrumentation report is missing a field or holds an unparsable value
    #[error("malformed report {path}: {reason}")]
    Report { path: PathBuf, reason: String },

    #[error("malformed results file {path}: {reason}")]
    Csv { path: PathBuf, reason: String },

    #[error("invalid column specification '{spec}': {reason}")]
    ColumnSpec { spec: String, reason: String },
}
