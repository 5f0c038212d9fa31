//! Filesystem-based output service implementation
//!
//! Writes happen in two phases: every artifact is first written to a
//! sibling temp file, and only once all of them are on disk are they renamed
//! into place. A failure in the first phase removes the temp files and
//! leaves existing output untouched; a failed rename removes the temp files
//! not yet moved.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::{ApplicationError, OutputService};
use crate::generation::Artifact;

const STAGING_SUFFIX: &str = ".servicegen-tmp";

/// Output service that writes artifacts to the filesystem
pub struct FileSystemOutputService;

impl FileSystemOutputService {
    pub fn new() -> Self {
        Self
    }

    /// Destination of an artifact under `root`; absolute paths and `..` are rejected
    fn destination(root: &Path, artifact: &Artifact) -> Result<PathBuf, ApplicationError> {
        let escapes = artifact
            .path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || artifact.path.as_os_str().is_empty() {
            return Err(ApplicationError::OutputError(format!(
                "Artifact path {} is not relative to the output root",
                artifact.path.display()
            )));
        }
        Ok(root.join(&artifact.path))
    }

    fn staging_path(destination: &Path) -> PathBuf {
        let mut staged = destination.as_os_str().to_owned();
        staged.push(STAGING_SUFFIX);
        PathBuf::from(staged)
    }

    async fn stage(artifact: &Artifact, destination: &Path) -> Result<PathBuf, ApplicationError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ApplicationError::OutputError(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let staged = Self::staging_path(destination);
        let mut file = fs::File::create(&staged).await.map_err(|e| {
            ApplicationError::OutputError(format!("Failed to create file {}: {e}", staged.display()))
        })?;
        file.write_all(artifact.content.as_bytes()).await.map_err(|e| {
            ApplicationError::OutputError(format!("Failed to write file {}: {e}", staged.display()))
        })?;
        file.flush().await.map_err(|e| {
            ApplicationError::OutputError(format!("Failed to flush file {}: {e}", staged.display()))
        })?;

        #[cfg(unix)]
        if let Some(mode) = artifact.permissions {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&staged, std::fs::Permissions::from_mode(mode))
                .await
                .map_err(|e| {
                    ApplicationError::OutputError(format!(
                        "Failed to set permissions on {}: {e}",
                        staged.display()
                    ))
                })?;
        }

        Ok(staged)
    }

    async fn discard(staged: &[(PathBuf, PathBuf)]) {
        for (temp, _) in staged {
            if let Err(e) = fs::remove_file(temp).await {
                tracing::warn!(path = %temp.display(), error = %e, "failed to remove staged file");
            }
        }
    }
}

#[async_trait]
impl OutputService for FileSystemOutputService {
    async fn write_artifacts(
        &self,
        root: &Path,
        artifacts: &[Artifact],
    ) -> Result<Vec<PathBuf>, ApplicationError> {
        let mut destinations = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            destinations.push(Self::destination(root, artifact)?);
        }

        let mut staged = Vec::with_capacity(artifacts.len());
        for (artifact, destination) in artifacts.iter().zip(&destinations) {
            match Self::stage(artifact, destination).await {
                Ok(temp) => staged.push((temp, destination.clone())),
                Err(e) => {
                    Self::discard(&staged).await;
                    return Err(e);
                }
            }
        }

        for (index, (temp, destination)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(temp, destination).await {
                Self::discard(&staged[index..]).await;
                return Err(ApplicationError::OutputError(format!(
                    "Failed to move {} into place: {e}",
                    destination.display()
                )));
            }
            tracing::debug!(path = %destination.display(), "wrote artifact");
        }

        Ok(destinations)
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), ApplicationError> {
        fs::create_dir_all(path).await.map_err(|e| {
            ApplicationError::OutputError(format!(
                "Failed to create directory {}: {e}",
                path.display()
            ))
        })
    }
}

impl Default for FileSystemOutputService {
    fn default() -> Self {
        Self::new()
    }
}
