//! Generator configuration file (`servicegen.toml`)
//!
//! ```toml
//! module = "example.com/queue"
//! language = "go"
//! skip-schemas = ["ApplicationError", "Page", "Pageable", "Sort"]
//! post-commands = ["gofmt -w internal"]
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::application::{ApplicationError, GenerateServiceRequest, ValidationError};
use crate::generation::{Language, default_skipped_schemas};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub module: Option<String>,
    pub language: Language,
    pub skip_schemas: BTreeSet<String>,
    pub post_commands: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module: None,
            language: Language::default(),
            skip_schemas: default_skipped_schemas(),
            post_commands: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml(content: &str) -> Result<Self, ValidationError> {
        toml::from_str(content).map_err(|e| ValidationError::InvalidConfiguration(e.to_string()))
    }

    pub async fn load(path: &Path) -> Result<Self, ApplicationError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Seed a request with the configured values
    pub fn request(&self, source: impl Into<String>, working_dir: impl Into<std::path::PathBuf>) -> GenerateServiceRequest {
        let mut request = GenerateServiceRequest::new(source, working_dir);
        request.language = self.language;
        request.module = self.module.clone();
        request.skipped_schemas = self.skip_schemas.clone();
        request.post_commands = self.post_commands.clone();
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GeneratorConfig::from_toml("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert!(config.skip_schemas.contains("Page"));
    }

    #[test]
    fn test_kebab_case_keys() {
        let config = GeneratorConfig::from_toml(
            r#"
module = "example.com/queue"
language = "go"
skip-schemas = ["Legacy"]
post-commands = ["gofmt -w internal", "go vet ./..."]
"#,
        )
        .unwrap();

        assert_eq!(config.module.as_deref(), Some("example.com/queue"));
        assert_eq!(config.skip_schemas, BTreeSet::from(["Legacy".to_string()]));
        assert_eq!(config.post_commands.len(), 2);

        let request = config.request("open-api.yaml", "/srv/queue");
        assert_eq!(request.module.as_deref(), Some("example.com/queue"));
        assert!(!request.skipped_schemas.contains("Page"));
    }

    #[test]
    fn test_unknown_keys_and_languages_are_rejected() {
        assert!(matches!(
            GeneratorConfig::from_toml("modul = \"x\""),
            Err(ValidationError::InvalidConfiguration(_))
        ));
        assert!(GeneratorConfig::from_toml("language = \"cobol\"").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servicegen.toml");
        std::fs::write(&path, "module = \"example.com/queue\"\n").unwrap();

        let config = GeneratorConfig::load(&path).await.unwrap();
        assert_eq!(config.module.as_deref(), Some("example.com/queue"));

        let missing = GeneratorConfig::load(&dir.path().join("absent.toml")).await;
        assert!(matches!(missing, Err(ApplicationError::IoError(_))));
    }
}
