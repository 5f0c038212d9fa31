//! Composite OpenAPI loader that picks a loading strategy per source

use crate::generation::{ApiDocument, GenerationError, OpenApiLoader};
use async_trait::async_trait;

use super::{FileOpenApiLoader, HttpOpenApiLoader};

/// Routes URLs to the HTTP loader and everything else to the file loader
pub struct CompositeOpenApiLoader {
    http: HttpOpenApiLoader,
    file: FileOpenApiLoader,
}

impl CompositeOpenApiLoader {
    pub fn new() -> Result<Self, GenerationError> {
        Ok(Self {
            http: HttpOpenApiLoader::new()?,
            file: FileOpenApiLoader::new(),
        })
    }
}

/// Whether a source names a remote description
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[async_trait]
impl OpenApiLoader for CompositeOpenApiLoader {
    async fn load(&self, source: &str) -> Result<ApiDocument, GenerationError> {
        if is_remote(source) {
            tracing::debug!(source, "loading description over HTTP");
            self.http.load(source).await
        } else {
            tracing::debug!(source, "loading description from file");
            self.file.load(source).await
        }
    }
}
