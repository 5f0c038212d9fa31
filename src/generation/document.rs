//! In-memory schema graph of an OpenAPI interface description
//!
//! References to `#/components/schemas/*` are kept symbolic ([`SchemaRef::Reference`])
//! so recursive schemas never need eager expansion. Everything else the loader
//! meets behind a `$ref` (parameters, responses, request bodies) is inlined.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

use crate::generation::GenerationError;

/// Prefix of a component schema reference
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Vendor extensions (`x-*` keys) attached to a node
pub type Extensions = BTreeMap<String, JsonValue>;

/// A parsed OpenAPI description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDocument {
    pub version: String,
    pub info: ApiInfo,
    pub paths: BTreeMap<String, PathItem>,
    pub schemas: BTreeMap<String, Schema>,
    pub extensions: Extensions,
}

impl ApiDocument {
    /// Look up a component schema by name
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Follow a schema reference to the schema it names
    pub fn resolve<'a>(&'a self, schema: &'a SchemaRef) -> Result<&'a Schema, GenerationError> {
        match schema {
            SchemaRef::Inline(inline) => Ok(inline),
            SchemaRef::Reference(name) => self.schema(name).ok_or_else(|| {
                GenerationError::unresolvable(name.as_str(), "no such component schema")
            }),
        }
    }

    /// Whether the schema (after following a reference) declares enum literals
    pub fn is_enum(&self, schema: &SchemaRef) -> bool {
        self.resolve(schema)
            .map(|resolved| resolved.is_enum())
            .unwrap_or(false)
    }
}

/// API metadata from the `info` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// HTTP methods in the order operations are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl HttpMethod {
    pub fn all() -> &'static [HttpMethod] {
        &[
            HttpMethod::Delete,
            HttpMethod::Get,
            HttpMethod::Head,
            HttpMethod::Options,
            HttpMethod::Patch,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Trace,
        ]
    }

    /// Capitalized name, e.g. `Get`
    pub fn display_name(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "Delete",
            HttpMethod::Get => "Get",
            HttpMethod::Head => "Head",
            HttpMethod::Options => "Options",
            HttpMethod::Patch => "Patch",
            HttpMethod::Post => "Post",
            HttpMethod::Put => "Put",
            HttpMethod::Trace => "Trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Delete => write!(f, "delete"),
            HttpMethod::Get => write!(f, "get"),
            HttpMethod::Head => write!(f, "head"),
            HttpMethod::Options => write!(f, "options"),
            HttpMethod::Patch => write!(f, "patch"),
            HttpMethod::Post => write!(f, "post"),
            HttpMethod::Put => write!(f, "put"),
            HttpMethod::Trace => write!(f, "trace"),
        }
    }
}

/// A path template with its operations and shared parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    pub parameters: Vec<Parameter>,
    pub operations: BTreeMap<HttpMethod, Operation>,
}

/// A single API operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code as written (`"200"`, `"default"`, ...)
    pub responses: BTreeMap<String, Response>,
    pub extensions: Extensions,
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// Operation or path-level parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<SchemaRef>,
    pub description: Option<String>,
}

/// Request body of an operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

/// A response declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    pub content: BTreeMap<String, MediaType>,
}

/// Body schema for one content type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Option<SchemaRef>,
}

/// Either a symbolic component reference or an inline schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaRef {
    Reference(String),
    Inline(Box<Schema>),
}

impl SchemaRef {
    pub fn inline(schema: Schema) -> Self {
        SchemaRef::Inline(Box::new(schema))
    }

    /// The referenced component name, if this is a reference
    pub fn reference(&self) -> Option<&str> {
        match self {
            SchemaRef::Reference(name) => Some(name),
            SchemaRef::Inline(_) => None,
        }
    }
}

/// XML serialization hints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlObject {
    pub name: Option<String>,
    pub prefix: Option<String>,
    pub attribute: bool,
}

/// A schema node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub schema_type: Option<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub properties: BTreeMap<String, SchemaRef>,
    pub required: Vec<String>,
    pub items: Option<Box<SchemaRef>>,
    /// `additionalProperties` when given as a schema; `true`/`false` are dropped
    pub additional_properties: Option<Box<SchemaRef>>,
    pub enum_values: Vec<JsonValue>,
    pub all_of: Vec<SchemaRef>,
    pub xml: Option<XmlObject>,
    pub extensions: Extensions,
}

impl Schema {
    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.schema_type.as_deref() == Some(name)
    }

    pub fn has_format(&self, name: &str) -> bool {
        self.format.as_deref() == Some(name)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}
