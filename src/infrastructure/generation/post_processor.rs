//! Post-processing: in-memory normalization before the write, and the
//! post-generation commands run once the tree is on disk

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::application::{CommandOutcome, PostCommandService};
use crate::generation::{Artifact, GenerationContext, GenerationError, PostProcessor};
use crate::infrastructure::shell::{CommandExecutor, CommandResult};

/// Normalizes whitespace in rendered sources: trailing spaces stripped,
/// runs of blank lines collapsed to one, leading blank lines dropped and
/// exactly one final newline
pub struct FormattingPostProcessor;

impl FormattingPostProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        let mut blank_run = true;

        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                if blank_run {
                    continue;
                }
                blank_run = true;
            } else {
                blank_run = false;
            }
            out.push_str(line);
            out.push('\n');
        }

        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}

impl Default for FormattingPostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostProcessor for FormattingPostProcessor {
    async fn process(
        &self,
        mut artifacts: Vec<Artifact>,
        context: &GenerationContext,
    ) -> Result<Vec<Artifact>, GenerationError> {
        let extension = context.language.file_extension();
        for artifact in &mut artifacts {
            let matches = artifact
                .path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == extension);
            if matches {
                artifact.content = Self::normalize(&artifact.content);
            }
        }
        Ok(artifacts)
    }
}

/// Composite post-processor that runs multiple processors in sequence
pub struct CompositePostProcessor {
    processors: Vec<Box<dyn PostProcessor>>,
}

impl CompositePostProcessor {
    pub fn new(processors: Vec<Box<dyn PostProcessor>>) -> Self {
        Self { processors }
    }
}

impl Default for CompositePostProcessor {
    fn default() -> Self {
        Self::new(vec![Box::new(FormattingPostProcessor::new())])
    }
}

#[async_trait]
impl PostProcessor for CompositePostProcessor {
    async fn process(
        &self,
        mut artifacts: Vec<Artifact>,
        context: &GenerationContext,
    ) -> Result<Vec<Artifact>, GenerationError> {
        for processor in &self.processors {
            artifacts = processor.process(artifacts, context).await?;
        }
        Ok(artifacts)
    }
}

/// Runs the configured post-generation commands in order.
///
/// A failing command is logged and the remaining ones still run; the
/// generated tree is already complete at this point.
pub struct CommandRunner {
    executor: Arc<dyn CommandExecutor>,
}

impl CommandRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    pub async fn run(&self, commands: &[String], working_dir: &Path) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::with_capacity(commands.len());

        for command in commands {
            tracing::info!(command = %command, "Executing post-generation command");

            let succeeded = match self.executor.execute(command, working_dir).await {
                Ok(result) if result.is_success() => {
                    log_output(command, &result);
                    true
                }
                Ok(result) => {
                    tracing::error!(
                        command = %command,
                        exit_code = result.exit_code,
                        error = result.summary().unwrap_or_default(),
                        "Post-generation command failed"
                    );
                    false
                }
                Err(e) => {
                    tracing::error!(
                        command = %command,
                        error = %e,
                        "Failed to execute post-generation command"
                    );
                    false
                }
            };

            outcomes.push(CommandOutcome {
                command: command.clone(),
                succeeded,
            });
        }

        outcomes
    }
}

#[async_trait]
impl PostCommandService for CommandRunner {
    async fn run_commands(&self, commands: &[String], working_dir: &Path) -> Vec<CommandOutcome> {
        self.run(commands, working_dir).await
    }
}

fn log_output(command: &str, result: &CommandResult) {
    if result.stdout.trim().is_empty() {
        tracing::debug!(command = %command, "Post-generation command completed");
    } else {
        tracing::debug!(
            command = %command,
            output = %result.stdout.trim(),
            "Post-generation command completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Language;
    use crate::infrastructure::shell::MockCommandExecutor;
    use std::path::PathBuf;
    use tracing_test::traced_test;

    #[test]
    fn test_normalize_whitespace() {
        let raw = "\n\npackage dto  \n\n\n\ntype A struct {\t\n}\n\n\n";
        assert_eq!(
            FormattingPostProcessor::normalize(raw),
            "package dto\n\ntype A struct {\n}\n"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = FormattingPostProcessor::normalize("a\n\n\nb");
        assert_eq!(once, "a\n\nb\n");
        assert_eq!(FormattingPostProcessor::normalize(&once), once);
    }

    #[tokio::test]
    async fn test_formatting_only_touches_target_sources() {
        let context = GenerationContext::new(Language::Go, "example.com/queue");
        let artifacts = vec![
            Artifact::new("internal/data/dto/ticket.go", "package dto\n\n\n"),
            Artifact::new("README.md", "# Queue\n\n\n"),
        ];

        let result = FormattingPostProcessor::new()
            .process(artifacts, &context)
            .await
            .unwrap();

        assert_eq!(result[0].content, "package dto\n");
        assert_eq!(result[1].content, "# Queue\n\n\n");
    }

    #[tokio::test]
    async fn test_composite_runs_in_sequence() {
        let context = GenerationContext::new(Language::Go, "example.com/queue");
        let composite = CompositePostProcessor::default();

        let result = composite
            .process(vec![Artifact::new("a.go", "x  \n")], &context)
            .await
            .unwrap();

        assert_eq!(result[0].content, "x\n");
        assert_eq!(result[0].path, PathBuf::from("a.go"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_command_runner_continues_after_failure() {
        let executor = Arc::new(
            MockCommandExecutor::new()
                .with_result("gofmt -w internal", 2, "", "internal/x.go:3:1: expected declaration")
                .with_result("go mod tidy", 0, "", ""),
        );
        let runner = CommandRunner::new(executor.clone());
        let commands = vec!["gofmt -w internal".to_string(), "go mod tidy".to_string()];

        let outcomes = runner.run(&commands, Path::new("/tmp/queue")).await;

        assert_eq!(
            outcomes,
            vec![
                CommandOutcome {
                    command: "gofmt -w internal".to_string(),
                    succeeded: false,
                },
                CommandOutcome {
                    command: "go mod tidy".to_string(),
                    succeeded: true,
                },
            ]
        );
        assert_eq!(executor.invoked(), commands);
        assert!(executor.calls.lock().unwrap().iter().all(|(_, dir)| dir == Path::new("/tmp/queue")));
        assert!(logs_contain("Post-generation command failed"));
    }

    #[tokio::test]
    async fn test_command_runner_spawn_error_is_not_fatal() {
        let runner = CommandRunner::new(Arc::new(MockCommandExecutor::new()));
        let outcomes = runner.run(&["missing".to_string()], Path::new(".")).await;
        assert!(!outcomes[0].succeeded);
    }
}
