//! Extension reader
//!
//! Generation directives live in vendor extensions on schema and operation
//! nodes. This module is the only place that knows their names and shapes.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::generation::{ApiDocument, Extensions, GenerationError, HttpMethod, Operation, Schema, SchemaRef};

pub const X_GROUP: &str = "x-group";
pub const X_VALIDATE: &str = "x-validate";
pub const X_PAGE: &str = "x-page";
pub const X_GENERATED: &str = "x-generated";
pub const X_CONFIGURATION: &str = "x-configuration";
pub const X_ERRORS: &str = "x-errors";

/// `allOf` chains deeper than this are not searched for a paging marker
const MAX_ENVELOPE_DEPTH: usize = 8;

/// Per-operation directives from `x-generated`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDirectives {
    pub package: String,
    pub custom_handler: bool,
    pub is_public: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedExtension {
    package: Option<String>,
    #[serde(default)]
    custom_handler: bool,
    #[serde(default)]
    is_public: bool,
}

#[derive(Deserialize)]
struct ConfigurationExtension {
    module: Option<String>,
}

/// One entry of the `x-errors` catalogue
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDeclaration {
    pub message: String,
    pub http_code: u16,
    #[serde(default)]
    pub has_values: bool,
    pub description: Option<String>,
}

/// A paging envelope found on a response schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEnvelope {
    /// Component name of the `content` items, when declared
    pub item: Option<String>,
}

/// Decode an object-valued extension. The value may be inline or a JSON-encoded string.
fn object_extension<T: DeserializeOwned>(
    owner: &str,
    extensions: &Extensions,
    name: &str,
) -> Result<Option<T>, GenerationError> {
    let Some(value) = extensions.get(name) else {
        return Ok(None);
    };

    let decoded = match value {
        JsonValue::String(raw) => serde_json::from_str(raw),
        other => serde_json::from_value(other.clone()),
    };

    decoded
        .map(Some)
        .map_err(|e| GenerationError::extension(owner, name, e.to_string()))
}

fn bool_extension(owner: &str, extensions: &Extensions, name: &str) -> Result<bool, GenerationError> {
    match extensions.get(name) {
        None | Some(JsonValue::Null) => Ok(false),
        Some(JsonValue::Bool(flag)) => Ok(*flag),
        Some(other) => Err(GenerationError::extension(
            owner,
            name,
            format!("expected a boolean, got {other}"),
        )),
    }
}

/// Go module path from `x-configuration.module`
pub fn module(document: &ApiDocument) -> Result<String, GenerationError> {
    let configuration: ConfigurationExtension =
        object_extension("document", &document.extensions, X_CONFIGURATION)?
            .ok_or_else(|| GenerationError::MissingModule("x-configuration not defined".to_string()))?;

    configuration
        .module
        .filter(|module| !module.trim().is_empty())
        .ok_or_else(|| GenerationError::MissingModule("module not defined".to_string()))
}

/// Grouping key of a schema, `None` when absent
pub fn schema_group(name: &str, schema: &Schema) -> Result<Option<String>, GenerationError> {
    match schema.extensions.get(X_GROUP) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(group)) if !group.trim().is_empty() => Ok(Some(group.clone())),
        Some(other) => Err(GenerationError::extension(
            name,
            X_GROUP,
            format!("expected a non-empty string, got {other}"),
        )),
    }
}

/// Validation-rule tokens from `x-validate`, order preserved.
///
/// Accepts a list of strings or a single comma-separated string.
pub fn validation_tokens(owner: &str, schema: &Schema) -> Result<Vec<String>, GenerationError> {
    let tokens = match schema.extensions.get(X_VALIDATE) {
        None | Some(JsonValue::Null) => return Ok(Vec::new()),
        Some(JsonValue::String(raw)) => raw.split(',').map(str::to_string).collect::<Vec<_>>(),
        Some(JsonValue::Array(values)) => values
            .iter()
            .map(|value| {
                value.as_str().map(String::from).ok_or_else(|| {
                    GenerationError::extension(owner, X_VALIDATE, format!("token {value} is not a string"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(GenerationError::extension(
                owner,
                X_VALIDATE,
                format!("expected a list of strings, got {other}"),
            ));
        }
    };

    Ok(tokens
        .into_iter()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect())
}

/// Directives from `x-generated`; the package is mandatory
pub fn operation_directives(
    method: HttpMethod,
    path: &str,
    operation: &Operation,
) -> Result<OperationDirectives, GenerationError> {
    let owner = format!("{} {path}", method.display_name().to_uppercase());
    let missing = || GenerationError::MissingPackage {
        method: method.display_name().to_uppercase(),
        path: path.to_string(),
    };

    let generated: GeneratedExtension =
        object_extension(&owner, &operation.extensions, X_GENERATED)?.ok_or_else(missing)?;

    let package = generated
        .package
        .filter(|package| !package.trim().is_empty())
        .ok_or_else(missing)?;

    if !package
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(GenerationError::extension(
            owner,
            X_GENERATED,
            format!("package {package:?} is not a lowercase identifier"),
        ));
    }

    Ok(OperationDirectives {
        package,
        custom_handler: generated.custom_handler,
        is_public: generated.is_public,
    })
}

/// Whether a schema carries the paging marker, directly or through its first `allOf` member
pub fn is_page_schema(document: &ApiDocument, schema: &Schema) -> Result<bool, GenerationError> {
    let mut current = schema;
    for _ in 0..MAX_ENVELOPE_DEPTH {
        if bool_extension("schema", &current.extensions, X_PAGE)? {
            return Ok(true);
        }
        match current.all_of.first() {
            Some(first) => current = document.resolve(first)?,
            None => return Ok(false),
        }
    }
    Ok(false)
}

/// Detect a paging envelope and the component its `content` array holds
pub fn page_envelope(
    document: &ApiDocument,
    schema: &SchemaRef,
) -> Result<Option<PageEnvelope>, GenerationError> {
    let resolved = document.resolve(schema)?;
    if !is_page_schema(document, resolved)? {
        return Ok(None);
    }

    let mut candidates = vec![resolved];
    for member in &resolved.all_of {
        candidates.push(document.resolve(member)?);
    }

    for candidate in candidates {
        let Some(content) = candidate.properties.get("content") else {
            continue;
        };
        let content = document.resolve(content)?;
        if let Some(name) = content.items.as_deref().and_then(SchemaRef::reference) {
            return Ok(Some(PageEnvelope {
                item: Some(name.to_string()),
            }));
        }
    }

    Ok(Some(PageEnvelope { item: None }))
}

/// Error declarations from the root `x-errors` map, sorted by code
pub fn error_declarations(
    document: &ApiDocument,
) -> Result<BTreeMap<String, ErrorDeclaration>, GenerationError> {
    Ok(object_extension("document", &document.extensions, X_ERRORS)?.unwrap_or_default())
}
