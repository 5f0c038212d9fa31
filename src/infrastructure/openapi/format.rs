//! Text decoding shared by the loaders
//!
//! YAML mappings may use non-string keys (`200:` for a status code); they are
//! turned into their string form so the document is valid JSON.

use serde_json::{Map, Number, Value as JsonValue};
use serde_yaml::Value as YamlValue;

use crate::generation::GenerationError;

/// Serialization of a loaded description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// Try JSON, then YAML
    Unknown,
}

impl DocumentFormat {
    /// Detect from a content type (if any) and the source's extension
    pub fn detect(source: &str, content_type: Option<&str>) -> Self {
        let content_type = content_type.unwrap_or_default();
        let source = source.split(['?', '#']).next().unwrap_or(source);
        if content_type.contains("json") || source.ends_with(".json") {
            DocumentFormat::Json
        } else if content_type.contains("yaml") || source.ends_with(".yaml") || source.ends_with(".yml") {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Unknown
        }
    }
}

/// Decode description text into a JSON value
pub fn decode(content: &str, format: DocumentFormat) -> Result<JsonValue, GenerationError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(GenerationError::SerializationError),
        DocumentFormat::Yaml => decode_yaml(content),
        DocumentFormat::Unknown => serde_json::from_str(content)
            .or_else(|_| decode_yaml(content))
            .map_err(|e| GenerationError::LoadError(format!("Failed to parse OpenAPI description: {e}"))),
    }
}

fn decode_yaml(content: &str) -> Result<JsonValue, GenerationError> {
    let yaml: YamlValue = serde_yaml::from_str(content)
        .map_err(|e| GenerationError::LoadError(format!("Failed to parse YAML: {e}")))?;
    yaml_to_json(yaml)
}

fn yaml_to_json(value: YamlValue) -> Result<JsonValue, GenerationError> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(flag) => JsonValue::Bool(flag),
        YamlValue::Number(number) => {
            if let Some(int) = number.as_i64() {
                JsonValue::from(int)
            } else if let Some(uint) = number.as_u64() {
                JsonValue::from(uint)
            } else {
                number
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map(JsonValue::Number)
                    .ok_or_else(|| GenerationError::LoadError(format!("Unrepresentable number {number}")))?
            }
        }
        YamlValue::String(text) => JsonValue::String(text),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_key(key: YamlValue) -> Result<String, GenerationError> {
    match key {
        YamlValue::String(text) => Ok(text),
        YamlValue::Number(number) => Ok(number.to_string()),
        YamlValue::Bool(flag) => Ok(flag.to_string()),
        other => Err(GenerationError::LoadError(format!(
            "Unsupported mapping key {other:?}"
        ))),
    }
}
