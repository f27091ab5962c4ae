use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::hooks::{Hook, HookName, HookSet};
use crate::error::HarnessError;

pub const REPEAT_VARIABLE: &str = "BENCHMARK_REPEAT";
pub const RETRY_VARIABLE: &str = "BENCHMARK_RETRY";

const KNOWN_KEYS: [&str; 4] = [REPEAT_VARIABLE, RETRY_VARIABLE, "hooks", "env"];

/// Declarations found in one `benchy.yml`, before layering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    /// File the layer was read from
    pub path: PathBuf,
    pub repeat: Option<u32>,
    pub retry: Option<u32>,
    pub hooks: HookSet,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    // Option so that a bare `hooks:` or `env:` reads as empty
    #[serde(default)]
    hooks: Option<BTreeMap<String, String>>,
    #[serde(default)]
    env: Option<BTreeMap<String, Value>>,
}

impl ConfigLayer {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {path:?}"))?;
        Self::parse(path, &contents)
    }

    /// Parse configuration text; `path` is only used for diagnostics
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let document: Value =
            serde_yaml::from_str(contents).map_err(|source| HarnessError::ConfigSyntax {
                path: path.to_path_buf(),
                source,
            })?;

        // Empty files and files holding only comments declare nothing
        if document.is_null() {
            return Ok(Self {
                path: path.to_path_buf(),
                ..Default::default()
            });
        }

        if let Value::Mapping(mapping) = &document {
            for key in mapping.keys() {
                let key = key.as_str().unwrap_or_default();
                if !KNOWN_KEYS.contains(&key) {
                    return Err(HarnessError::UnknownKey {
                        path: path.to_path_buf(),
                        key: key.to_string(),
                    }
                    .into());
                }
            }
        }

        // A declared variable must hold a value, even when it is empty or `~`
        let numeric = |name: &str| {
            document
                .get(name)
                .map(|value| parse_unsigned(path, name, value))
                .transpose()
        };
        let repeat = numeric(REPEAT_VARIABLE)?;
        let retry = numeric(RETRY_VARIABLE)?;

        let raw: RawLayer =
            serde_yaml::from_value(document).map_err(|source| HarnessError::ConfigSyntax {
                path: path.to_path_buf(),
                source,
            })?;

        let mut hooks = HookSet::default();
        for (name, script) in raw.hooks.unwrap_or_default() {
            let hook_name: HookName = name.parse().map_err(|_| HarnessError::UnknownHook {
                path: path.to_path_buf(),
                name: name.clone(),
            })?;
            hooks.set(hook_name, Hook::new(script));
        }

        let mut env = BTreeMap::new();
        for (key, value) in raw.env.unwrap_or_default() {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => anyhow::bail!(
                    "{}: env.{key} must be a scalar, got {other:?}",
                    path.display()
                ),
            };
            env.insert(key, value);
        }

        Ok(Self {
            path: path.to_path_buf(),
            repeat,
            retry,
            hooks,
            env,
        })
    }
}

/// Accept YAML integers and strings holding an unsigned integer
fn parse_unsigned(path: &Path, name: &str, value: &Value) -> Result<u32, HarnessError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse::<u32>().ok()
            } else {
                None
            }
        }
        _ => None,
    };

    parsed.ok_or_else(|| HarnessError::Config {
        path: path.to_path_buf(),
        name: name.to_string(),
        value: serde_yaml::to_string(value)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| format!("{value:?}")),
    })
}
