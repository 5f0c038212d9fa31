//! Error types for the generation domain

use thiserror::Error;

/// Errors that can occur while loading, compiling or rendering a service description
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("OpenAPI loading error: {0}")]
    LoadError(String),

    #[error("Invalid extension {extension} on {owner}: {reason}")]
    InvalidExtension {
        owner: String,
        extension: String,
        reason: String,
    },

    #[error("x-configuration not defined or module missing: {0}")]
    MissingModule(String),

    #[error("Schema {0} has no x-group and is not an enum")]
    MissingGroup(String),

    #[error("Unresolvable schema {reference}: {reason}")]
    UnresolvableSchema { reference: String, reason: String },

    #[error("Array schema {0} has no items")]
    ArrayWithoutItems(String),

    #[error("Invalid enum {name}: {reason}")]
    InvalidEnum { name: String, reason: String },

    #[error("Enum {name}: literals {first:?} and {second:?} both normalize to {ident}")]
    EnumCollision {
        name: String,
        first: String,
        second: String,
        ident: String,
    },

    #[error("Operation {method} {path} does not define x-generated package")]
    MissingPackage { method: String, path: String },

    #[error("Operation {method} {path} does not define an operationId")]
    MissingOperationId { method: String, path: String },

    #[error("Operation {0} does not define a success response code")]
    MissingStatusCode(String),

    #[error("Operation {operation} uses unsupported content type {content_type}")]
    UnsupportedContentType {
        operation: String,
        content_type: String,
    },

    #[error("Operation {operation} declares parameter {name} multiple times")]
    DuplicateParameter { operation: String, name: String },

    #[error("Operation {operation} parameters {first} and {second} both map to local {ident}")]
    ParameterIdentifierCollision {
        operation: String,
        first: String,
        second: String,
        ident: String,
    },

    #[error("Operation {operation} declares optional path parameter {name}")]
    OptionalPathParameter { operation: String, name: String },

    #[error("Operation {operation} has no path parameter for placeholder {{{name}}}")]
    MissingPathParameter { operation: String, name: String },

    #[error("Error code {0} is not part of the ApplicationError code enum")]
    UnknownErrorCode(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Post-processing error: {0}")]
    PostProcessingError(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl GenerationError {
    pub(crate) fn extension(
        owner: impl Into<String>,
        extension: &str,
        reason: impl Into<String>,
    ) -> Self {
        GenerationError::InvalidExtension {
            owner: owner.into(),
            extension: extension.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolvable(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerationError::UnresolvableSchema {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}
