//! Type resolver
//!
//! Converts schema descriptors into [`ResolvedType`]s. Resolution never
//! expands a component reference into its members; it only looks at the
//! target to tell enums from records, so recursive schemas are safe.

use crate::generation::{
    ApiDocument, GenerationError, Primitive, ResolvedType, Schema, SchemaRef,
};

/// `additionalProperties` chains deeper than this are treated as cyclic
const MAX_MAP_DEPTH: usize = 64;

pub struct TypeResolver<'a> {
    document: &'a ApiDocument,
}

impl<'a> TypeResolver<'a> {
    pub fn new(document: &'a ApiDocument) -> Self {
        Self { document }
    }

    /// Resolve a schema in a position where `required` decides nullability
    pub fn resolve(&self, schema: &SchemaRef, required: bool) -> Result<ResolvedType, GenerationError> {
        match schema {
            SchemaRef::Reference(name) => self.resolve_reference(name, required),
            SchemaRef::Inline(inline) => self.resolve_inline(inline, required),
        }
    }

    /// Resolve a schema in array-item or map-value position
    pub fn resolve_element(&self, schema: &SchemaRef) -> Result<ResolvedType, GenerationError> {
        if let SchemaRef::Inline(inline) = schema {
            if inline.is_type("object") && inline.format.is_none() && inline.additional_properties.is_none() {
                return Ok(ResolvedType::primitive(Primitive::Record, false));
            }
        }
        Ok(self.resolve(schema, true)?.as_element())
    }

    fn resolve_reference(&self, name: &str, required: bool) -> Result<ResolvedType, GenerationError> {
        let target = self
            .document
            .schema(name)
            .ok_or_else(|| GenerationError::unresolvable(name, "no such component schema"))?;

        if target.is_enum() {
            Ok(ResolvedType::enumeration(name, !required))
        } else {
            Ok(ResolvedType::reference(name))
        }
    }

    fn resolve_inline(&self, schema: &Schema, required: bool) -> Result<ResolvedType, GenerationError> {
        // Explicit formats win over structure
        match schema.format.as_deref() {
            Some("interface") => return Ok(ResolvedType::primitive(Primitive::Any, false)),
            Some("map") if schema.schema_type.is_none() || schema.is_type("object") => {
                return Ok(ResolvedType::primitive(Primitive::Record, !required));
            }
            _ => {}
        }

        match schema.schema_type.as_deref() {
            Some("array") => self.resolve_array(schema),
            Some("object") if schema.additional_properties.is_some() => self.resolve_map(schema),
            Some("object") => Ok(ResolvedType::primitive(Primitive::Record, !required)),
            Some(scalar) => Ok(ResolvedType::primitive(
                primitive_for(scalar, schema.format.as_deref()),
                !required,
            )),
            None if schema.additional_properties.is_some() => self.resolve_map(schema),
            None if !schema.properties.is_empty() || !schema.all_of.is_empty() => {
                Ok(ResolvedType::primitive(Primitive::Record, !required))
            }
            None => {
                tracing::warn!(
                    description = schema.description.as_deref().unwrap_or_default(),
                    "schema declares neither a type nor a reference, using an untyped value"
                );
                Ok(ResolvedType::primitive(Primitive::Any, false))
            }
        }
    }

    fn resolve_array(&self, schema: &Schema) -> Result<ResolvedType, GenerationError> {
        let items = schema.items.as_deref().ok_or_else(|| {
            GenerationError::ArrayWithoutItems(
                schema.description.clone().unwrap_or_else(|| "inline array".to_string()),
            )
        })?;
        Ok(ResolvedType::array(self.resolve_element(items)?))
    }

    /// Unwrap nested `additionalProperties` into nested maps
    fn resolve_map(&self, schema: &Schema) -> Result<ResolvedType, GenerationError> {
        let mut depth = 1;
        let mut terminal = schema
            .additional_properties
            .as_deref()
            .ok_or_else(|| GenerationError::unresolvable("additionalProperties", "missing value schema"))?;

        loop {
            let current = self.document.resolve(terminal)?;
            let nested = match current.additional_properties.as_deref() {
                Some(next) if current.format.is_none() && !current.is_type("array") => next,
                _ => break,
            };
            depth += 1;
            if depth > MAX_MAP_DEPTH {
                return Err(GenerationError::unresolvable(
                    terminal.reference().unwrap_or("additionalProperties"),
                    "additionalProperties chain is cyclic or too deep",
                ));
            }
            terminal = nested;
        }

        let mut resolved = self.resolve_element(terminal)?;
        for _ in 0..depth {
            resolved = ResolvedType::map(resolved);
        }
        Ok(resolved)
    }
}

/// Primitive mapping for scalar `type`/`format` pairs
pub fn primitive_for(schema_type: &str, format: Option<&str>) -> Primitive {
    match (schema_type, format) {
        ("integer", Some("int32") | Some("int")) => Primitive::Int32,
        ("integer", _) => Primitive::Int64,
        ("number", Some("float") | Some("float32")) => Primitive::Float32,
        ("number", _) => Primitive::Float64,
        ("boolean", _) => Primitive::Boolean,
        ("string", Some("date")) => Primitive::Date,
        ("string", Some("time")) => Primitive::Time,
        ("string", Some("local-date-time")) => Primitive::LocalDateTime,
        ("string", Some("date-time")) => Primitive::DateTime,
        _ => Primitive::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::test_support::document;
    use crate::generation::{Dependency, TypeKind, TypeShape};
    use serde_json::json;
    use tracing_test::traced_test;

    fn inline(value: serde_json::Value) -> SchemaRef {
        let doc = document(json!({
            "paths": {},
            "components": {"schemas": {"Probe": {"type": "object", "properties": {"p": value}}}}
        }));
        doc.schema("Probe").unwrap().properties["p"].clone()
    }

    fn fixture() -> ApiDocument {
        document(json!({
            "paths": {},
            "components": {"schemas": {
                "Status": {"type": "string", "enum": ["OPEN", "CLOSED"]},
                "Ticket": {"type": "object", "x-group": "ticket"},
                "Loop": {"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Loop"}}
            }}
        }))
    }

    #[test]
    fn test_primitive_table_and_nullability() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);

        let optional = resolver.resolve(&inline(json!({"type": "integer", "format": "int64"})), false).unwrap();
        assert_eq!(optional.shape, TypeShape::Primitive(Primitive::Int64));
        assert!(optional.nullable);

        let required = resolver.resolve(&inline(json!({"type": "string", "format": "date"})), true).unwrap();
        assert_eq!(required.shape, TypeShape::Primitive(Primitive::Date));
        assert!(!required.nullable);

        let instant = resolver.resolve(&inline(json!({"type": "string", "format": "date-time"})), true).unwrap();
        assert!(instant.imports.contains(&Dependency::Timestamp));

        assert_eq!(primitive_for("number", Some("float")), Primitive::Float32);
        assert_eq!(primitive_for("integer", None), Primitive::Int64);
        assert_eq!(primitive_for("string", Some("uuid")), Primitive::String);
    }

    #[test]
    fn test_reference_to_enum_is_qualified() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);

        let status = resolver.resolve(&SchemaRef::Reference("Status".into()), true).unwrap();
        assert_eq!(status.kind(), TypeKind::Enum);
        assert!(!status.nullable);
        assert!(status.imports.contains(&Dependency::Enum("Status".into())));

        let optional = resolver.resolve(&SchemaRef::Reference("Status".into()), false).unwrap();
        assert!(optional.nullable);
    }

    #[test]
    fn test_reference_to_record_is_nullable() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);
        let ticket = resolver.resolve(&SchemaRef::Reference("Ticket".into()), true).unwrap();
        assert_eq!(ticket.kind(), TypeKind::Reference);
        assert!(ticket.nullable);
    }

    #[test]
    fn test_missing_reference_is_unresolvable() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);
        let err = resolver.resolve(&SchemaRef::Reference("Nope".into()), true).unwrap_err();
        assert!(matches!(err, GenerationError::UnresolvableSchema { ref reference, .. } if reference == "Nope"));
    }

    #[test]
    fn test_arrays() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);

        let of_refs = resolver
            .resolve(&inline(json!({"type": "array", "items": {"$ref": "#/components/schemas/Ticket"}})), false)
            .unwrap();
        assert_eq!(of_refs.name(), "list<Ticket>");
        assert!(!of_refs.nullable);
        assert!(of_refs.needs_element_validation());
        assert!(!of_refs.element().unwrap().nullable);

        let of_objects = resolver
            .resolve(&inline(json!({"type": "array", "items": {"type": "object"}})), true)
            .unwrap();
        assert_eq!(of_objects.name(), "list<record>");
        assert!(!of_objects.needs_element_validation());

        let of_enums = resolver
            .resolve(&inline(json!({"type": "array", "items": {"$ref": "#/components/schemas/Status"}})), true)
            .unwrap();
        assert_eq!(of_enums.name(), "list<Status>");
        assert!(of_enums.imports.contains(&Dependency::Enum("Status".into())));

        let err = resolver.resolve(&inline(json!({"type": "array"})), true).unwrap_err();
        assert!(matches!(err, GenerationError::ArrayWithoutItems(_)));
    }

    #[test]
    fn test_nested_additional_properties_unwrap_into_maps() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);
        let nested = resolver
            .resolve(
                &inline(json!({
                    "type": "object",
                    "additionalProperties": {"type": "object", "additionalProperties": {"type": "string"}}
                })),
                false,
            )
            .unwrap();

        assert_eq!(nested.kind(), TypeKind::Map);
        assert!(!nested.nullable);
        let inner = nested.element().unwrap();
        assert_eq!(inner.kind(), TypeKind::Map);
        assert_eq!(inner.element().unwrap().shape, TypeShape::Primitive(Primitive::String));
        assert_eq!(nested.name(), "map<map<string>>");
    }

    #[test]
    fn test_map_terminal_reference() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);
        let by_id = resolver
            .resolve(
                &inline(json!({"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Ticket"}})),
                true,
            )
            .unwrap();
        assert_eq!(by_id.name(), "map<Ticket>");
        assert!(!by_id.element().unwrap().nullable);
    }

    #[test]
    fn test_cyclic_map_chain_is_rejected() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);
        let err = resolver
            .resolve(
                &inline(json!({"type": "object", "additionalProperties": {"$ref": "#/components/schemas/Loop"}})),
                true,
            )
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnresolvableSchema { .. }));
    }

    #[test]
    fn test_format_overrides_win() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);

        let any = resolver
            .resolve(&inline(json!({"type": "object", "format": "interface", "additionalProperties": {"type": "string"}})), false)
            .unwrap();
        assert_eq!(any.shape, TypeShape::Primitive(Primitive::Any));
        assert!(!any.nullable);

        let record = resolver
            .resolve(&inline(json!({"type": "object", "format": "map", "additionalProperties": {"type": "string"}})), false)
            .unwrap();
        assert_eq!(record.shape, TypeShape::Primitive(Primitive::Record));
        assert!(record.nullable);
    }

    #[test]
    #[traced_test]
    fn test_untyped_schema_warns() {
        let doc = fixture();
        let resolver = TypeResolver::new(&doc);
        let any = resolver.resolve(&inline(json!({"description": "free form"})), true).unwrap();
        assert_eq!(any.shape, TypeShape::Primitive(Primitive::Any));
        assert!(logs_contain("neither a type nor a reference"));
    }
}
