//! Port interfaces for the application layer

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ApplicationError;
use crate::generation::Artifact;

/// Service for writing generated artifacts to the output destination
#[async_trait]
pub trait OutputService: Send + Sync {
    /// Write every artifact under `root`, all or nothing, returning the
    /// written paths in artifact order
    async fn write_artifacts(
        &self,
        root: &Path,
        artifacts: &[Artifact],
    ) -> Result<Vec<PathBuf>, ApplicationError>;

    /// Ensure a directory exists
    async fn ensure_directory(&self, path: &Path) -> Result<(), ApplicationError>;
}

/// Outcome of one post-generation command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: String,
    pub succeeded: bool,
}

/// Runs post-generation commands once the output is on disk
#[async_trait]
pub trait PostCommandService: Send + Sync {
    /// Run every command in order; failures are reported, never fatal
    async fn run_commands(&self, commands: &[String], working_dir: &Path) -> Vec<CommandOutcome>;
}
