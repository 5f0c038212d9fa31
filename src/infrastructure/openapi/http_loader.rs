//! HTTP-based OpenAPI description loader

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::format::{DocumentFormat, decode};
use super::parser::OpenApiParser;
use crate::generation::{ApiDocument, GenerationError, OpenApiLoader};

/// Loads OpenAPI descriptions from HTTP/HTTPS URLs
pub struct HttpOpenApiLoader {
    client: Client,
}

impl HttpOpenApiLoader {
    pub fn new() -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| GenerationError::LoadError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl OpenApiLoader for HttpOpenApiLoader {
    async fn load(&self, source: &str) -> Result<ApiDocument, GenerationError> {
        let url = Url::parse(source)
            .map_err(|e| GenerationError::LoadError(format!("Invalid URL {source}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GenerationError::LoadError(format!(
                "HttpOpenApiLoader only handles HTTP(S) URLs, got: {source}"
            )));
        }

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            GenerationError::LoadError(format!("Failed to fetch OpenAPI description from {source}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::LoadError(format!(
                "HTTP {status} when fetching {source}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let content = response.text().await.map_err(|e| {
            GenerationError::LoadError(format!("Failed to read response body: {e}"))
        })?;

        let format = DocumentFormat::detect(url.path(), content_type.as_deref());
        OpenApiParser::new(decode(&content, format)?).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_loader_json() {
        let mock_server = MockServer::start().await;
        let spec_json = r#"{
            "openapi": "3.0.0",
            "info": {"title": "Test API", "version": "1.0.0"},
            "paths": {}
        }"#;

        Mock::given(method("GET"))
            .and(path("/openapi.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(spec_json)
                    .insert_header("content-type", "application/json"),
            )
            .mount(&mock_server)
            .await;

        let loader = HttpOpenApiLoader::new().unwrap();
        let doc = loader
            .load(&format!("{}/openapi.json", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(doc.version, "3.0.0");
        assert_eq!(doc.info.title, "Test API");
    }

    #[tokio::test]
    async fn test_http_loader_404() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notfound"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let loader = HttpOpenApiLoader::new().unwrap();
        let result = loader.load(&format!("{}/notfound", mock_server.uri())).await;

        match result {
            Err(GenerationError::LoadError(msg)) => assert!(msg.contains("HTTP 404")),
            other => panic!("Expected LoadError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_loader_non_http_url() {
        let loader = HttpOpenApiLoader::new().unwrap();
        match loader.load("file:///path/to/spec.yaml").await {
            Err(GenerationError::LoadError(msg)) => assert!(msg.contains("only handles HTTP")),
            other => panic!("Expected LoadError, got {other:?}"),
        }
    }
}
