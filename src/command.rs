use anyhow::{Context, Result};
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

/// Command execution context
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Name of the command for logging
    pub command_name: Option<String>,
    /// Working directory of the child process
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env_vars: BTreeMap<String, String>,
    /// Capture output instead of passing it through to the terminal
    pub capture_output: bool,
    /// Allow command to fail without returning an error
    pub allow_failure: bool,
}

/// Builder for CommandExecutor
pub struct CommandExecutorBuilder {
    context: CommandContext,
}

impl Default for CommandExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutorBuilder {
    /// Create a new CommandExecutorBuilder with default settings
    pub fn new() -> Self {
        Self {
            context: CommandContext::default(),
        }
    }

    /// Set whether to capture command output
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.context.capture_output = capture;
        self
    }

    /// Set the working directory
    pub fn working_dir<P: AsRef<Path>>(mut self, dir: Option<P>) -> Self {
        self.context.working_dir = dir.map(|d| d.as_ref().to_path_buf());
        self
    }

    /// Add environment variables
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.context
            .env_vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set whether to allow command failures without returning an error
    pub fn allow_failure(mut self, allow: bool) -> Self {
        self.context.allow_failure = allow;
        self
    }

    /// Set a name for the command for logging purposes
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.context.command_name = Some(name.into());
        self
    }

    pub fn build(self) -> CommandExecutor {
        CommandExecutor {
            context: self.context,
        }
    }
}

/// A unified interface for executing child processes
pub struct CommandExecutor {
    context: CommandContext,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    /// Create a new CommandExecutor with default settings
    pub fn new() -> Self {
        Self {
            context: CommandContext::default(),
        }
    }

    /// Create a builder for CommandExecutor with fluent configuration
    pub fn builder() -> CommandExecutorBuilder {
        CommandExecutorBuilder::new()
    }

    /// Execute a command with arguments and wait for it to complete, returning the output
    pub fn execute_command_with_args<S: AsRef<str>>(
        &self,
        cmd: &str,
        args: &[S],
    ) -> Result<Output> {
        let child = self.launch_command(cmd, args)?;

        let output = child.wait_with_output().with_context(|| {
            format!(
                "Failed to wait for command completion: {}",
                self.format_command(cmd, args)
            )
        })?;

        if !output.status.success() && !self.context.allow_failure {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!(
                "Command failed with status {}: {}\nStderr: {}",
                output.status.code().unwrap_or(-1),
                self.format_command(cmd, args),
                stderr
            ));
        }

        Ok(output)
    }

    /// Launch a command, returning the child process handle
    pub fn launch_command<S: AsRef<str>>(&self, cmd: &str, args: &[S]) -> Result<Child> {
        let command_str = self.format_command(cmd, args);
        debug!("Launching command: {}", command_str);

        let mut command = Command::new(cmd);
        command.args(args.iter().map(|a| a.as_ref()));

        if let Some(dir) = &self.context.working_dir {
            command.current_dir(dir);
        }

        command.envs(&self.context.env_vars);

        if self.context.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        command
            .spawn()
            .with_context(|| format!("Failed to spawn command: {}", command_str))
    }

    /// Format command and arguments for logging
    fn format_command<S: AsRef<str>>(&self, cmd: &str, args: &[S]) -> String {
        if let Some(name) = &self.context.command_name {
            return name.clone();
        }

        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        format!("{} {}", cmd, args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let executor = CommandExecutor::builder()
            .name("test command")
            .working_dir(Some("/tmp"))
            .capture_output(true)
            .env_vars([("TEST_VAR", "test_value"), ("OTHER", "1")])
            .allow_failure(true)
            .build();

        assert_eq!(
            executor.context.command_name,
            Some("test command".to_string())
        );
        assert_eq!(executor.context.working_dir, Some(PathBuf::from("/tmp")));
        assert!(executor.context.capture_output);
        assert_eq!(
            executor.context.env_vars.get("TEST_VAR"),
            Some(&"test_value".to_string())
        );
        assert_eq!(executor.context.env_vars.get("OTHER"), Some(&"1".to_string()));
        assert!(executor.context.allow_failure);
    }

    #[test]
    fn test_execute_command_success() {
        let executor = CommandExecutor::builder().capture_output(true).build();

        let output = executor.execute_command_with_args("echo", &["hello world"]).unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("hello world"));
    }

    #[test]
    fn test_positional_arguments_reach_shell() {
        let executor = CommandExecutor::builder().capture_output(true).build();

        let output = executor
            .execute_command_with_args("sh", &["-c", "echo \"$1:$2\"", "benchy", "q1.sql", "g"])
            .unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.trim(), "q1.sql:g");
    }

    #[test]
    fn test_working_dir_and_env_vars() {
        let dir = tempfile::tempdir().unwrap();
        let executor = CommandExecutor::builder()
            .capture_output(true)
            .working_dir(Some(dir.path()))
            .env_vars([("TEST_ENV_VAR", "test_value")])
            .build();

        let output = executor
            .execute_command_with_args("sh", &["-c", "echo $TEST_ENV_VAR; touch marker"])
            .unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("test_value"));
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_command_failure_handling() {
        let strict_executor = CommandExecutor::builder().capture_output(true).build();
        assert!(strict_executor.execute_command_with_args("false", &[] as &[&str]).is_err());

        let lenient_executor = CommandExecutor::builder()
            .capture_output(true)
            .allow_failure(true)
            .build();
        let result = lenient_executor.execute_command_with_args("false", &[] as &[&str]);
        assert!(result.is_ok());
        assert!(!result.unwrap().status.success());
    }

    #[test]
    fn test_format_command() {
        let named_executor = CommandExecutor::builder().name("test command").build();
        assert_eq!(
            named_executor.format_command("echo", &["hello", "world"]),
            "test command"
        );

        let unnamed_executor = CommandExecutor::builder().build();
        assert_eq!(
            unnamed_executor.format_command("echo", &["hello", "world"]),
            "echo hello world"
        );
    }
}
