use anyhow::Result;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::benchmarks::instrument::Instrument;
use crate::command::CommandExecutor;
use crate::config::{Configuration, Hook, HookName};

/// `$0` of every hook shell
const SHELL_NAME: &str = "benchy";

/// Arguments available to hooks at one point of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookArgs {
    pub suite: String,
    pub group: Option<String>,
    pub file: Option<String>,
    /// Current repetition (1-indexed)
    pub repetition: Option<u32>,
    /// Suite results directory for suite hooks, group results directory otherwise
    pub results_dir: PathBuf,
    /// Directory the hook process runs in
    pub working_dir: PathBuf,
}

impl HookArgs {
    pub fn suite(suite: &str, suite_dir: &Path, results_dir: &Path) -> Self {
        Self {
            suite: suite.to_string(),
            group: None,
            file: None,
            repetition: None,
            results_dir: results_dir.to_path_buf(),
            working_dir: suite_dir.to_path_buf(),
        }
    }

    pub fn group(suite: &str, group: &str, group_dir: &Path, results_dir: &Path) -> Self {
        Self {
            group: Some(group.to_string()),
            ..Self::suite(suite, group_dir, results_dir)
        }
    }

    pub fn with_file(&self, file: &str) -> Self {
        Self {
            file: Some(file.to_string()),
            ..self.clone()
        }
    }

    pub fn with_repetition(&self, repetition: u32) -> Self {
        Self {
            repetition: Some(repetition),
            ..self.clone()
        }
    }

    /// Positional arguments for `name`, in the order the hook declares them
    pub fn positional(&self, name: HookName) -> Vec<String> {
        name.parameters()
            .iter()
            .map(|param| match *param {
                "suite" => self.suite.clone(),
                "group" => self.group.clone().unwrap_or_default(),
                "file" => self.file.clone().unwrap_or_default(),
                "repetition" => self.repetition.map(|r| r.to_string()).unwrap_or_default(),
                "results_dir" => self.results_dir.display().to_string(),
                _ => String::new(),
            })
            .collect()
    }

    /// `BENCHY_*` variables describing the current position in the run
    pub fn env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("BENCHY_SUITE".to_string(), self.suite.clone());
        env.insert(
            "BENCHY_RESULTS_DIR".to_string(),
            self.results_dir.display().to_string(),
        );
        if let Some(group) = &self.group {
            env.insert("BENCHY_GROUP".to_string(), group.clone());
        }
        if let Some(file) = &self.file {
            env.insert("BENCHY_FILE".to_string(), file.clone());
        }
        if let Some(repetition) = self.repetition {
            env.insert("BENCHY_REPETITION".to_string(), repetition.to_string());
        }
        env
    }
}

/// A fully resolved hook invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    pub name: HookName,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl HookCall {
    /// Arguments for `sh` running `hook` with this call's positional arguments
    pub fn shell_args(&self, hook: &Hook) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            hook.script.clone(),
            SHELL_NAME.to_string(),
        ];
        args.extend(self.args.iter().cloned());
        args
    }

    /// Executor preconfigured with this call's directory and environment
    ///
    /// Predicate output is captured so that only the exit status is seen.
    pub fn executor(&self) -> CommandExecutor {
        CommandExecutor::builder()
            .name(format!("{} hook", self.name))
            .capture_output(self.name == HookName::IsBenchmark)
            .working_dir(Some(&self.working_dir))
            .env_vars(self.env.clone())
            .allow_failure(true)
            .build()
    }
}

/// Runs hook processes
pub trait HookExecutor {
    /// Run `hook`, returning whether it exited successfully
    fn execute(&self, hook: &Hook, call: &HookCall) -> Result<bool>;
}

/// Runs hooks as `sh -c <script> benchy <args...>`
#[derive(Debug, Default)]
pub struct ShellHookExecutor;

impl HookExecutor for ShellHookExecutor {
    fn execute(&self, hook: &Hook, call: &HookCall) -> Result<bool> {
        let output = call
            .executor()
            .execute_command_with_args("sh", &call.shell_args(hook))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{} hook output: {}", call.name, stdout.trim());
        }
        Ok(output.status.success())
    }
}

/// HookRunner dispatches the configured hooks for each lifecycle point
pub struct HookRunner {
    executor: Box<dyn HookExecutor>,
    instrument: Box<dyn Instrument>,
}

impl HookRunner {
    /// Create a HookRunner running hooks through `sh`
    pub fn new(instrument: Box<dyn Instrument>) -> Self {
        Self::with_executor(Box::new(ShellHookExecutor), instrument)
    }

    pub fn with_executor(executor: Box<dyn HookExecutor>, instrument: Box<dyn Instrument>) -> Self {
        Self {
            executor,
            instrument,
        }
    }

    fn call(config: &Configuration, name: HookName, args: &HookArgs) -> HookCall {
        let mut env = config.env.clone();
        env.extend(args.env());
        HookCall {
            name,
            args: args.positional(name),
            working_dir: args.working_dir.clone(),
            env,
        }
    }

    /// Run a hook whose exit status only matters for diagnostics
    pub fn run_hook(&self, config: &Configuration, name: HookName, args: &HookArgs) -> Result<()> {
        if let Some(success) = self.query(config, name, args)? {
            if !success {
                warn!("Hook {name} failed for {}", describe(args));
            }
        }
        Ok(())
    }

    /// Run a hook and report its exit status, or `None` if it is not defined
    pub fn query(
        &self,
        config: &Configuration,
        name: HookName,
        args: &HookArgs,
    ) -> Result<Option<bool>> {
        let Some(hook) = config.hooks.get(name) else {
            return Ok(None);
        };
        debug!("Running {name} hook for {}", describe(args));
        let call = Self::call(config, name, args);
        self.executor.execute(hook, &call).map(Some)
    }

    /// Run `run_benchmark` under the instrumentation tool, writing its report to `report`
    pub fn measure(
        &self,
        config: &Configuration,
        args: &HookArgs,
        report: &Path,
    ) -> Result<Option<bool>> {
        let Some(hook) = config.hooks.get(HookName::RunBenchmark) else {
            return Ok(None);
        };
        let call = Self::call(config, HookName::RunBenchmark, args);
        self.instrument.measure(hook, &call, report).map(Some)
    }
}

fn describe(args: &HookArgs) -> String {
    let mut parts = vec![args.suite.as_str()];
    parts.extend(args.group.as_deref());
    parts.extend(args.file.as_deref());
    let mut description = parts.join("/");
    if let Some(repetition) = args.repetition {
        description.push_str(&format!(" (repetition {repetition})"));
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::instrument::GnuTime;
    use std::fs;
    use tempfile::tempdir;

    fn group_args(dir: &Path) -> HookArgs {
        HookArgs::group("suite", "g1", dir, Path::new("/results/g1"))
    }

    #[test]
    fn test_positional_arguments_per_hook() {
        let args = group_args(Path::new("/suite/g1"))
            .with_file("q1.sql")
            .with_repetition(2);

        assert_eq!(args.positional(HookName::BeforeGroup), vec!["g1"]);
        assert_eq!(
            args.positional(HookName::IsBenchmark),
            vec!["q1.sql", "g1"]
        );
        assert_eq!(
            args.positional(HookName::BeforeBenchmarkRepetition),
            vec!["q1.sql", "g1", "2"]
        );
        assert_eq!(
            args.positional(HookName::RunBenchmark),
            vec!["q1.sql", "g1", "2", "/results/g1"]
        );
    }

    #[test]
    fn test_env_describes_position() {
        let env = group_args(Path::new("/suite/g1")).with_file("q1.sql").env();

        assert_eq!(env.get("BENCHY_SUITE").map(String::as_str), Some("suite"));
        assert_eq!(env.get("BENCHY_GROUP").map(String::as_str), Some("g1"));
        assert_eq!(env.get("BENCHY_FILE").map(String::as_str), Some("q1.sql"));
        assert!(!env.contains_key("BENCHY_REPETITION"));
    }

    #[test]
    fn test_undefined_hook_is_not_run() {
        let runner = HookRunner::new(Box::new(GnuTime::default()));
        let config = Configuration::default();
        let dir = tempdir().unwrap();

        let result = runner
            .query(&config, HookName::IsBenchmark, &group_args(dir.path()))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_shell_hook_sees_arguments_env_and_working_dir() {
        let dir = tempdir().unwrap();
        let runner = HookRunner::new(Box::new(GnuTime::default()));
        let mut config = Configuration::default();
        config.env.insert("EXTRA".to_string(), "x".to_string());
        config.hooks.set(
            HookName::BeforeBenchmark,
            Hook::new(r#"echo "$1 $2 $BENCHY_SUITE $EXTRA" > seen"#),
        );

        let args = group_args(dir.path()).with_file("q1.sql");
        let result = runner
            .query(&config, HookName::BeforeBenchmark, &args)
            .unwrap();

        assert_eq!(result, Some(true));
        let seen = fs::read_to_string(dir.path().join("seen")).unwrap();
        assert_eq!(seen.trim(), "q1.sql g1 suite x");
    }

    #[test]
    fn test_predicate_reports_exit_status() {
        let dir = tempdir().unwrap();
        let runner = HookRunner::new(Box::new(GnuTime::default()));
        let mut config = Configuration::default();
        config
            .hooks
            .set(HookName::IsBenchmark, Hook::new(r#"[ "${1##*.}" = "sql" ]"#));

        let args = group_args(dir.path());
        assert_eq!(
            runner
                .query(&config, HookName::IsBenchmark, &args.with_file("q1.sql"))
                .unwrap(),
            Some(true)
        );
        assert_eq!(
            runner
                .query(&config, HookName::IsBenchmark, &args.with_file("setup.sh"))
                .unwrap(),
            Some(false)
        );
    }

    #[test]
    fn test_only_predicate_output_is_captured() {
        let call = |name| HookCall {
            name,
            args: Vec::new(),
            working_dir: PathBuf::from("/"),
            env: BTreeMap::new(),
        };
        let echo = Hook::new("echo visible");
        let run = |call: HookCall| {
            call.executor()
                .execute_command_with_args("sh", &call.shell_args(&echo))
                .unwrap()
        };

        assert!(ShellHookExecutor
            .execute(&echo, &call(HookName::IsBenchmark))
            .unwrap());
        let predicate = run(call(HookName::IsBenchmark));
        assert_eq!(String::from_utf8_lossy(&predicate.stdout).trim(), "visible");

        let lifecycle = run(call(HookName::BeforeGroup));
        assert!(lifecycle.stdout.is_empty());
    }

    #[test]
    fn test_failing_lifecycle_hook_is_not_fatal() {
        let dir = tempdir().unwrap();
        let runner = HookRunner::new(Box::new(GnuTime::default()));
        let mut config = Configuration::default();
        config.hooks.set(HookName::AfterGroup, Hook::new("exit 3"));

        assert!(runner
            .run_hook(&config, HookName::AfterGroup, &group_args(dir.path()))
            .is_ok());
    }
}
