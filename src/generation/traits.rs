//! Port interfaces for the generation domain

use async_trait::async_trait;

use crate::generation::{
    ApiDocument, Artifact, GenerationContext, GenerationError, Language, ServiceModel,
};

/// Renders the semantic model into files for one target language
pub trait ServiceRenderer: Send + Sync {
    /// Language this renderer targets
    fn language(&self) -> Language;

    /// Render every artifact; paths are relative to the working directory
    fn render(
        &self,
        model: &ServiceModel,
        context: &GenerationContext,
    ) -> Result<Vec<Artifact>, GenerationError>;
}

/// Post-processes rendered artifacts before they are written
#[async_trait]
pub trait PostProcessor: Send + Sync {
    async fn process(
        &self,
        artifacts: Vec<Artifact>,
        context: &GenerationContext,
    ) -> Result<Vec<Artifact>, GenerationError>;
}

/// Loads OpenAPI descriptions
#[async_trait]
pub trait OpenApiLoader: Send + Sync {
    /// Load and parse a description from a source
    async fn load(&self, source: &str) -> Result<ApiDocument, GenerationError>;
}
