//! Enum emitter
//!
//! Builds [`EnumDefinition`]s from declared literal lists. The parse and
//! stringify behaviour of the generated code is mirrored here so the
//! round-trip law can be checked without compiling the output.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::generation::{EnumBase, EnumDefinition, EnumValue, GenerationError, Schema};

/// Identifier of the sentinel constant every enum carries
pub const UNKNOWN_VALUE: &str = "UNKNOWN_VALUE";

/// Prefix given to literals that start with a digit
pub const DIGIT_PREFIX: &str = "ENUM_";

/// Failure of the generated parse function
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnumParseError {
    #[error("invalid value ('{literal}') passed to {name}")]
    Validation { name: String, literal: String },
}

/// Turn a literal into a constant identifier.
///
/// # Examples
/// ```
/// use servicegen::generation::enums::normalize_literal;
///
/// assert_eq!(normalize_literal("MY.SOMETHING"), "MY_SOMETHING");
/// assert_eq!(normalize_literal("1_SOMETHING"), "ENUM_1_SOMETHING");
/// ```
pub fn normalize_literal(literal: &str) -> String {
    let prefixed = match literal.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("{DIGIT_PREFIX}{literal}"),
        _ => literal.to_string(),
    };
    prefixed.replace('.', "_")
}

/// Build the definition of an enum schema
pub fn build_enum(name: &str, schema: &Schema) -> Result<EnumDefinition, GenerationError> {
    let invalid = |reason: String| GenerationError::InvalidEnum {
        name: name.to_string(),
        reason,
    };

    let base = match (schema.schema_type.as_deref(), schema.format.as_deref()) {
        (None | Some("string"), _) => EnumBase::String,
        (Some("integer"), Some("int32") | Some("int")) => EnumBase::Int32,
        (Some("integer"), _) => EnumBase::Int64,
        (Some(other), _) => return Err(invalid(format!("unsupported enum type {other}"))),
    };
    let is_string_backed = base == EnumBase::String;

    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    seen.insert(UNKNOWN_VALUE.to_string(), UNKNOWN_VALUE.to_string());

    let mut values = Vec::with_capacity(schema.enum_values.len());
    for value in &schema.enum_values {
        let literal = match value {
            JsonValue::String(literal) => literal.clone(),
            JsonValue::Number(number) if !is_string_backed && number.is_i64() => number.to_string(),
            other => return Err(invalid(format!("literal {other} is not a string"))),
        };

        if literal.is_empty() {
            return Err(invalid("empty literal".to_string()));
        }
        if !is_string_backed && literal.parse::<i64>().is_err() {
            return Err(invalid(format!("literal {literal:?} is not an integer")));
        }

        let ident = normalize_literal(&literal);
        if !ident.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(invalid(format!(
                "literal {literal:?} does not normalize to an identifier"
            )));
        }

        if let Some(first) = seen.insert(ident.clone(), literal.clone()) {
            return Err(GenerationError::EnumCollision {
                name: name.to_string(),
                first,
                second: literal,
                ident,
            });
        }

        values.push(EnumValue { literal, ident });
    }

    Ok(EnumDefinition {
        name: name.to_string(),
        package: name.to_lowercase(),
        is_string_backed,
        base,
        description: schema.description.clone(),
        values,
    })
}

impl EnumDefinition {
    /// Text of the constant named `ident`, as the generated `String()` returns it
    pub fn stringify(&self, ident: &str) -> Option<&str> {
        if ident == UNKNOWN_VALUE {
            return Some(UNKNOWN_VALUE);
        }
        self.values
            .iter()
            .find(|value| value.ident == ident)
            .map(|value| value.literal.as_str())
    }

    /// Literal accepted by the generated parse function, answering the declared literal
    pub fn parse(&self, source: &str) -> Result<&str, EnumParseError> {
        self.values
            .iter()
            .find(|value| value.literal == source)
            .map(|value| value.literal.as_str())
            .ok_or_else(|| EnumParseError::Validation {
                name: self.name.clone(),
                literal: source.to_string(),
            })
    }

    /// Constant identifier for a literal
    pub fn ident_of(&self, literal: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|value| value.literal == literal)
            .map(|value| value.ident.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enum_schema(schema_type: &str, values: serde_json::Value) -> Schema {
        Schema {
            schema_type: Some(schema_type.to_string()),
            enum_values: serde_json::from_value(values).unwrap(),
            ..Schema::default()
        }
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_literal("1_SOMETHING"), "ENUM_1_SOMETHING");
        assert_eq!(normalize_literal("MY.SOMETHING"), "MY_SOMETHING");
        assert_eq!(
            normalize_literal("1.3.158.00165387.100.40.50"),
            "ENUM_1_3_158_00165387_100_40_50"
        );
        assert_eq!(normalize_literal("OPEN"), "OPEN");
    }

    #[test]
    fn test_build_preserves_order() {
        let definition =
            build_enum("TicketState", &enum_schema("string", json!(["WAITING", "1_CALLED", "done.ok"]))).unwrap();
        let idents: Vec<_> = definition.values.iter().map(|v| v.ident.as_str()).collect();
        assert_eq!(idents, vec!["WAITING", "ENUM_1_CALLED", "done_ok"]);
        assert_eq!(definition.package, "ticketstate");
        assert!(definition.is_string_backed);
    }

    #[test]
    fn test_round_trip_law() {
        let definition = build_enum(
            "Channel",
            &enum_schema("string", json!(["1_SOMETHING", "MY.SOMETHING", "KIOSK"])),
        )
        .unwrap();

        for value in &definition.values {
            let stringified = definition.stringify(&normalize_literal(&value.literal)).unwrap();
            assert_eq!(definition.parse(stringified).unwrap(), value.literal);
        }

        assert_eq!(
            definition.parse("MY_SOMETHING"),
            Err(EnumParseError::Validation {
                name: "Channel".to_string(),
                literal: "MY_SOMETHING".to_string(),
            })
        );
        assert!(definition.parse("").is_err());
        assert_eq!(definition.stringify(UNKNOWN_VALUE), Some(UNKNOWN_VALUE));
    }

    #[test]
    fn test_collision_is_an_error() {
        let err = build_enum("Version", &enum_schema("string", json!(["1.0", "1_0"]))).unwrap_err();
        match err {
            GenerationError::EnumCollision { first, second, ident, .. } => {
                assert_eq!(first, "1.0");
                assert_eq!(second, "1_0");
                assert_eq!(ident, "ENUM_1_0");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = build_enum("Weird", &enum_schema("string", json!(["UNKNOWN_VALUE"]))).unwrap_err();
        assert!(matches!(err, GenerationError::EnumCollision { .. }));
    }

    #[test]
    fn test_integer_backed_enum() {
        let definition = build_enum("Priority", &enum_schema("integer", json!([1, 2, "3"]))).unwrap();
        assert!(!definition.is_string_backed);
        assert_eq!(definition.base, EnumBase::Int64);
        assert_eq!(definition.ident_of("2"), Some("ENUM_2"));
    }

    #[test]
    fn test_invalid_literals() {
        assert!(matches!(
            build_enum("Flag", &enum_schema("string", json!([true]))),
            Err(GenerationError::InvalidEnum { .. })
        ));
        assert!(matches!(
            build_enum("Flag", &enum_schema("string", json!([""]))),
            Err(GenerationError::InvalidEnum { .. })
        ));
        assert!(matches!(
            build_enum("Flag", &enum_schema("string", json!(["has space"]))),
            Err(GenerationError::InvalidEnum { .. })
        ));
        assert!(matches!(
            build_enum("Level", &enum_schema("integer", json!(["high"]))),
            Err(GenerationError::InvalidEnum { .. })
        ));
    }
}
