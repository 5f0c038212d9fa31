//! Generation context - the settings that flow through one compiler run

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::generation::{ApiDocument, GenerationError, Language, extensions};

/// Schema names provided by the shared runtime and never emitted as DTOs
pub const DEFAULT_SKIPPED_SCHEMAS: &[&str] = &[
    "ApplicationError",
    "ApplicationErrorValues",
    "Page",
    "Pageable",
    "Sort",
];

/// Settings for one generation run
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub language: Language,
    /// Go module path generated imports are rooted at
    pub module: String,
    pub skipped_schemas: BTreeSet<String>,
    pub metadata: GenerationMetadata,
}

/// Metadata about the generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub title: String,
    pub api_version: String,
    pub module: String,
    pub generator_version: String,
}

impl GenerationContext {
    /// Create a context with the default skip set
    pub fn new(language: Language, module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            language,
            metadata: GenerationMetadata {
                module: module.clone(),
                generator_version: env!("CARGO_PKG_VERSION").to_string(),
                ..GenerationMetadata::default()
            },
            module,
            skipped_schemas: default_skipped_schemas(),
        }
    }

    /// Build a context for a document, taking the module from `x-configuration`
    /// unless one is given explicitly
    pub fn for_document(
        document: &ApiDocument,
        language: Language,
        module_override: Option<&str>,
    ) -> Result<Self, GenerationError> {
        let module = match module_override {
            Some(module) => module.to_string(),
            None => extensions::module(document)?,
        };

        let mut context = Self::new(language, module);
        context.metadata.title = document.info.title.clone();
        context.metadata.api_version = document.info.version.clone();
        Ok(context)
    }

    /// Replace the skip set
    pub fn with_skipped_schemas<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skipped_schemas = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_skipped(&self, schema: &str) -> bool {
        self.skipped_schemas.contains(schema)
    }

    /// Validate the context has all required data
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.module.trim().is_empty() {
            return Err(GenerationError::MissingModule(
                "module path is empty".to_string(),
            ));
        }
        if self.module.chars().any(char::is_whitespace) {
            return Err(GenerationError::ValidationError(format!(
                "Module path {:?} contains whitespace",
                self.module
            )));
        }
        Ok(())
    }
}

/// The default skip set as owned names
pub fn default_skipped_schemas() -> BTreeSet<String> {
    DEFAULT_SKIPPED_SCHEMAS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults() {
        let context = GenerationContext::new(Language::Go, "example.com/queue");
        assert_eq!(context.module, "example.com/queue");
        assert!(context.is_skipped("Page"));
        assert!(context.is_skipped("ApplicationErrorValues"));
        assert!(!context.is_skipped("Ticket"));
        assert_eq!(context.metadata.module, "example.com/queue");
        assert!(context.validate().is_ok());
    }

    #[test]
    fn test_context_skip_set_is_replaceable() {
        let context =
            GenerationContext::new(Language::Go, "example.com/queue").with_skipped_schemas(["Ticket"]);
        assert!(context.is_skipped("Ticket"));
        assert!(!context.is_skipped("Page"));
    }

    #[test]
    fn test_context_rejects_empty_module() {
        let context = GenerationContext::new(Language::Go, " ");
        assert!(matches!(
            context.validate(),
            Err(GenerationError::MissingModule(_))
        ));
    }
}
