//! File-based OpenAPI description loader
//!
//! This loader handles only file I/O. The actual parsing is done by the OpenApiParser.

use async_trait::async_trait;
use tokio::fs;

use super::format::{DocumentFormat, decode};
use super::parser::OpenApiParser;
use crate::generation::{ApiDocument, GenerationError, OpenApiLoader};

/// Loads OpenAPI descriptions from local files
pub struct FileOpenApiLoader;

impl FileOpenApiLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OpenApiLoader for FileOpenApiLoader {
    async fn load(&self, source: &str) -> Result<ApiDocument, GenerationError> {
        let content = fs::read_to_string(source).await.map_err(|e| {
            GenerationError::LoadError(format!("Failed to read {source}: {e}"))
        })?;

        let value = decode(&content, DocumentFormat::detect(source, None))?;
        OpenApiParser::new(value).parse()
    }
}

impl Default for FileOpenApiLoader {
    fn default() -> Self {
        Self::new()
    }
}
