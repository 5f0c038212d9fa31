//! Request and response types of the application layer

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::application::ValidationError;
use crate::generation::{GenerationMetadata, Language, default_skipped_schemas};

/// Request to generate service scaffolding from one description
#[derive(Debug, Clone)]
pub struct GenerateServiceRequest {
    /// Path or URL of the OpenAPI description
    pub source: String,
    /// Root the artifact paths are relative to
    pub working_dir: PathBuf,
    pub language: Language,
    /// Overrides `x-configuration.module`
    pub module: Option<String>,
    pub skipped_schemas: BTreeSet<String>,
    pub post_commands: Vec<String>,
    /// Compile and render without writing
    pub dry_run: bool,
}

impl GenerateServiceRequest {
    pub fn new(source: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            working_dir: working_dir.into(),
            language: Language::default(),
            module: None,
            skipped_schemas: default_skipped_schemas(),
            post_commands: Vec::new(),
            dry_run: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "OpenAPI description source".to_string(),
            ));
        }

        if let Some(module) = &self.module {
            if module.trim().is_empty() || module.chars().any(char::is_whitespace) {
                return Err(ValidationError::InvalidModule(module.clone()));
            }
        }

        if let Some(index) = self.post_commands.iter().position(|c| c.trim().is_empty()) {
            return Err(ValidationError::BlankCommand(index));
        }

        Ok(())
    }
}

/// Response from service generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerateServiceResponse {
    /// Artifact paths relative to the working directory, sorted
    pub artifacts: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub written: bool,
    pub failed_commands: Vec<String>,
    pub metadata: GenerationMetadata,
}
