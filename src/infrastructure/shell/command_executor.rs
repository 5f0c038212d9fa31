//! Command executor for running post-generation commands
//!
//! Commands such as `gofmt -w internal` or `go mod tidy` run through the
//! platform shell inside the output root once every artifact is on disk.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::generation::GenerationError;

/// Trait for executing shell commands
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute a shell command in the given working directory
    async fn execute(
        &self,
        command: &str,
        working_dir: &Path,
    ) -> Result<CommandResult, GenerationError>;
}

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, `-1` when the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// First non-empty line of stderr, falling back to stdout
    pub fn summary(&self) -> Option<&str> {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
    }
}

/// Runs commands through `sh -c` (`cmd /C` on Windows)
pub struct ShellCommandExecutor {
    shell: &'static str,
    flag: &'static str,
}

impl ShellCommandExecutor {
    pub fn new() -> Self {
        if cfg!(target_os = "windows") {
            Self {
                shell: "cmd",
                flag: "/C",
            }
        } else {
            Self {
                shell: "sh",
                flag: "-c",
            }
        }
    }
}

impl Default for ShellCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellCommandExecutor {
    async fn execute(
        &self,
        command: &str,
        working_dir: &Path,
    ) -> Result<CommandResult, GenerationError> {
        tracing::debug!(command = %command, dir = %working_dir.display(), "spawning command");

        let output = Command::new(self.shell)
            .arg(self.flag)
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                GenerationError::PostProcessingError(format!(
                    "Failed to spawn '{command}' in {}: {e}",
                    working_dir.display()
                ))
            })?;

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Scripted executor that records every invocation
#[cfg(test)]
pub struct MockCommandExecutor {
    results: std::collections::HashMap<String, CommandResult>,
    pub calls: std::sync::Mutex<Vec<(String, std::path::PathBuf)>>,
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self {
            results: std::collections::HashMap::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_result(mut self, command: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.results.insert(
            command.to_string(),
            CommandResult {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn invoked(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(command, _)| command.clone()).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl CommandExecutor for MockCommandExecutor {
    async fn execute(
        &self,
        command: &str,
        working_dir: &Path,
    ) -> Result<CommandResult, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), working_dir.to_path_buf()));
        self.results.get(command).cloned().ok_or_else(|| {
            GenerationError::PostProcessingError(format!("no scripted result for {command}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_shell_executor_runs_in_working_dir() {
        let executor = ShellCommandExecutor::new();
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker.go"), "package marker").unwrap();

        let command = if cfg!(target_os = "windows") { "dir /b" } else { "ls" };
        let result = executor.execute(command, dir.path()).await.unwrap();

        assert!(result.is_success());
        assert!(result.stdout.contains("marker.go"));
    }

    #[tokio::test]
    async fn test_shell_executor_reports_exit_code() {
        let executor = ShellCommandExecutor::new();
        let dir = tempdir().unwrap();

        let result = executor.execute("exit 3", dir.path()).await.unwrap();

        assert!(!result.is_success());
        assert_eq!(result.exit_code, 3);
    }

    #[test]
    fn test_summary_prefers_stderr() {
        let result = CommandResult {
            exit_code: 1,
            stdout: "formatted 3 files\n".to_string(),
            stderr: "\n  gofmt: syntax error\nmore\n".to_string(),
        };
        assert_eq!(result.summary(), Some("gofmt: syntax error"));

        let quiet = CommandResult {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(quiet.summary(), None);
    }

    #[tokio::test]
    async fn test_mock_executor_records_calls() {
        let executor = MockCommandExecutor::new().with_result("go mod tidy", 0, "", "");
        let dir = tempdir().unwrap();

        assert!(executor.execute("go mod tidy", dir.path()).await.unwrap().is_success());
        assert!(executor.execute("go vet", dir.path()).await.is_err());
        assert_eq!(executor.invoked(), vec!["go mod tidy", "go vet"]);
    }
}
