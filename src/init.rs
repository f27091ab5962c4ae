use anyhow::{Context, Result};
use log::info;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::{
    HookName, CONFIG_FILE_NAME, DEFAULT_REPEAT, DEFAULT_RETRY, REPEAT_VARIABLE, RETRY_VARIABLE,
};
use crate::path_utils;

/// Commented `benchy.yml` with the defaults and every hook
pub fn template() -> String {
    let mut out = String::new();
    out.push_str("# Benchmark suite configuration. Groups may carry their own benchy.yml\n");
    out.push_str("# overriding any of these settings for that group only.\n\n");
    out.push_str(&format!("{REPEAT_VARIABLE}: {DEFAULT_REPEAT}\n"));
    out.push_str(&format!("{RETRY_VARIABLE}: {DEFAULT_RETRY}\n\n"));
    out.push_str("# Extra environment for every hook\n");
    out.push_str("env: {}\n\n");
    out.push_str("# Hooks are shell snippets; positional arguments are listed per hook.\n");
    out.push_str("hooks:\n");
    for name in HookName::ALL {
        let params = name
            .parameters()
            .iter()
            .enumerate()
            .map(|(i, p)| format!("${}={p}", i + 1))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("  # {name}: ''  # {params}\n"));
    }
    out
}

/// Create `suite_path` if needed and write a template configuration into it
pub fn init_suite(suite_path: &Path) -> Result<PathBuf> {
    path_utils::ensure_directory(suite_path)?;
    let path = suite_path.join(CONFIG_FILE_NAME);

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            anyhow::bail!("Configuration already exists: {path:?}")
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to create {path:?}")),
    };
    file.write_all(template().as_bytes())
        .with_context(|| format!("Failed to write {path:?}"))?;

    info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_template_parses_to_defaults() {
        let layer = ConfigLayer::parse(Path::new(CONFIG_FILE_NAME), &template()).unwrap();
        assert_eq!(layer.repeat, Some(DEFAULT_REPEAT));
        assert_eq!(layer.retry, Some(DEFAULT_RETRY));
        assert!(layer.hooks.defined().is_empty());
        assert!(layer.env.is_empty());
    }

    #[test]
    fn test_template_mentions_every_hook() {
        let template = template();
        for name in HookName::ALL {
            assert!(template.contains(&format!("# {name}:")), "{name} missing");
        }
    }

    #[test]
    fn test_init_creates_suite_and_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let suite = dir.path().join("new-suite");

        let path = init_suite(&suite).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), template());

        fs::write(&path, "BENCHMARK_REPEAT: 9\n").unwrap();
        assert!(init_suite(&suite).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "BENCHMARK_REPEAT: 9\n");
    }
}
