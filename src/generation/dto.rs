//! DTO emitter
//!
//! Walks component schemas in alphabetical order and sorts them into
//! [`Group`]s of [`Record`]s, plus one [`EnumDefinition`] per enum schema.

use std::collections::BTreeMap;

use crate::generation::enums::build_enum;
use crate::generation::extensions::{is_page_schema, schema_group, validation_tokens};
use crate::generation::resolver::TypeResolver;
use crate::generation::utils::to_public_identifier;
use crate::generation::{
    ApiDocument, EnumDefinition, Field, GenerationContext, GenerationError, Group, Record,
    ResolvedType, Schema, SchemaRef, XmlBinding, XmlRoot,
};

pub const RULE_REQUIRED: &str = "required";
pub const RULE_DIVE: &str = "dive";

/// Records and enums built from the component schemas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DtoOutput {
    pub groups: Vec<Group>,
    pub enums: Vec<EnumDefinition>,
}

pub struct DtoEmitter<'a> {
    document: &'a ApiDocument,
    context: &'a GenerationContext,
    resolver: TypeResolver<'a>,
}

impl<'a> DtoEmitter<'a> {
    pub fn new(document: &'a ApiDocument, context: &'a GenerationContext) -> Self {
        Self {
            document,
            context,
            resolver: TypeResolver::new(document),
        }
    }

    pub fn emit(&self) -> Result<DtoOutput, GenerationError> {
        let mut groups: BTreeMap<String, Group> = BTreeMap::new();
        let mut enums = Vec::new();

        for (name, schema) in &self.document.schemas {
            if self.context.is_skipped(name) {
                tracing::debug!(schema = %name, "schema is provided by the shared runtime, skipping");
                continue;
            }

            if schema.is_enum() {
                enums.push(build_enum(name, schema)?);
                continue;
            }

            if is_page_schema(self.document, schema)? {
                tracing::debug!(schema = %name, "paging envelope, skipping");
                continue;
            }

            let group_name =
                schema_group(name, schema)?.ok_or_else(|| GenerationError::MissingGroup(name.clone()))?;
            let record = self.build_record(name, schema)?;

            let group = groups.entry(group_name.clone()).or_insert_with(|| Group {
                name: group_name,
                records: Vec::new(),
                dependencies: Default::default(),
            });
            for field in &record.fields {
                group.dependencies.extend(field.ty.imports.iter().cloned());
            }
            if let Some(alias) = &record.alias {
                group.dependencies.extend(alias.imports.iter().cloned());
            }
            group.records.push(record);
        }

        Ok(DtoOutput {
            groups: groups.into_values().collect(),
            enums,
        })
    }

    /// Build one record: composed references, then inline composed members, then own properties
    pub fn build_record(&self, name: &str, schema: &Schema) -> Result<Record, GenerationError> {
        let xml_root = schema.xml.as_ref().map(|xml| XmlRoot {
            name: xml.name.clone().unwrap_or_else(|| name.to_string()),
            prefix: xml.prefix.clone(),
        });

        let alias = if schema.is_type("array")
            || (schema.additional_properties.is_some()
                && schema.properties.is_empty()
                && schema.all_of.is_empty())
        {
            Some(self.resolver.resolve(&SchemaRef::inline(schema.clone()), true)?)
        } else {
            None
        };

        let mut fields = Vec::new();

        for member in &schema.all_of {
            if let SchemaRef::Reference(target) = member {
                if self.document.schema(target).is_none() {
                    return Err(GenerationError::unresolvable(
                        target.as_str(),
                        format!("composed into {name} but not defined"),
                    ));
                }
                insert_field(&mut fields, embedded_field(target));
            }
        }

        for member in &schema.all_of {
            if let SchemaRef::Inline(inline) = member {
                self.collect_properties(&mut fields, name, inline, xml_root.is_some())?;
            }
        }

        self.collect_properties(&mut fields, name, schema, xml_root.is_some())?;

        Ok(Record {
            name: name.to_string(),
            description: schema.description.clone(),
            fields,
            xml_root,
            alias,
        })
    }

    fn collect_properties(
        &self,
        fields: &mut Vec<Field>,
        owner: &str,
        holder: &Schema,
        xml_bound: bool,
    ) -> Result<(), GenerationError> {
        for (property, schema) in &holder.properties {
            let required = holder.is_required(property);
            let ty = self.resolver.resolve(schema, required)?;

            let inline = match schema {
                SchemaRef::Inline(inline) => Some(inline.as_ref()),
                SchemaRef::Reference(_) => None,
            };

            let mut validation = match inline {
                Some(inline) => validation_tokens(&format!("{owner}.{property}"), inline)?,
                None => Vec::new(),
            };
            add_rules(&mut validation, &ty, required);

            let xml = match inline.and_then(|inline| inline.xml.as_ref()) {
                Some(xml) => Some(XmlBinding {
                    name: xml.name.clone().unwrap_or_else(|| property.clone()),
                    prefix: xml.prefix.clone(),
                    attribute: xml.attribute,
                }),
                None if xml_bound => Some(XmlBinding {
                    name: property.clone(),
                    prefix: None,
                    attribute: false,
                }),
                None => None,
            };

            insert_field(
                fields,
                Field {
                    name: property.clone(),
                    ident: to_public_identifier(property),
                    ty,
                    validation,
                    serialization_key: property.clone(),
                    omit_empty: !required,
                    embedded: false,
                    xml,
                },
            );
        }
        Ok(())
    }
}

/// Append implied rules after the declared ones: `required` unless the value
/// always has a zero value, then `dive` when elements need validating
pub fn add_rules(validation: &mut Vec<String>, ty: &ResolvedType, required: bool) {
    if required && !ty.is_value_primitive() && !validation.iter().any(|r| r == RULE_REQUIRED) {
        validation.push(RULE_REQUIRED.to_string());
    }
    if ty.needs_element_validation() && !validation.iter().any(|r| r == RULE_DIVE) {
        validation.push(RULE_DIVE.to_string());
    }
}

fn embedded_field(target: &str) -> Field {
    Field {
        name: target.to_string(),
        ident: target.to_string(),
        ty: ResolvedType::composition(target),
        validation: Vec::new(),
        serialization_key: String::new(),
        omit_empty: false,
        embedded: true,
        xml: None,
    }
}

/// A later declaration of the same name replaces the earlier one in place
fn insert_field(fields: &mut Vec<Field>, field: Field) {
    match fields.iter_mut().find(|existing| existing.name == field.name) {
        Some(existing) => *existing = field,
        None => fields.push(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::test_support::document;
    use crate::generation::{Dependency, Language, Primitive, TypeKind, TypeShape};
    use serde_json::json;

    fn context() -> GenerationContext {
        GenerationContext::new(Language::Go, "example.com/queue")
    }

    fn queue_document() -> ApiDocument {
        document(json!({
            "paths": {},
            "components": {"schemas": {
                "Base": {
                    "type": "object",
                    "x-group": "common",
                    "required": ["id"],
                    "properties": {"id": {"type": "integer", "format": "int64"}, "version": {"type": "integer"}}
                },
                "Ticket": {
                    "x-group": "ticket",
                    "allOf": [
                        {"$ref": "#/components/schemas/Base"},
                        {"type": "object", "required": ["extra"], "properties": {"extra": {"type": "string"}}}
                    ]
                },
                "Counter": {
                    "type": "object",
                    "x-group": "ticket",
                    "required": ["name", "state", "tickets", "open"],
                    "properties": {
                        "name": {"type": "string", "x-validate": ["max=32"]},
                        "state": {"$ref": "#/components/schemas/CounterState"},
                        "tickets": {"type": "array", "items": {"$ref": "#/components/schemas/Ticket"}},
                        "open": {"type": "boolean"},
                        "openedAt": {"type": "string", "format": "date-time"},
                        "_links": {"type": "object"}
                    }
                },
                "CounterState": {"type": "string", "enum": ["OPEN", "CLOSED"]},
                "Page": {"type": "object", "x-page": true},
                "TicketPage": {"allOf": [{"$ref": "#/components/schemas/Page"}]},
                "Labels": {"type": "object", "x-group": "common", "additionalProperties": {"type": "string"}}
            }}
        }))
    }

    #[test]
    fn test_groups_and_enums() {
        let doc = queue_document();
        let ctx = context();
        let output = DtoEmitter::new(&doc, &ctx).emit().unwrap();

        let names: Vec<_> = output.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["common", "ticket"]);

        let ticket_group = &output.groups[1];
        let records: Vec<_> = ticket_group.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(records, vec!["Counter", "Ticket"]);

        assert_eq!(output.enums.len(), 1);
        assert_eq!(output.enums[0].name, "CounterState");
        assert!(ticket_group.dependencies.contains(&Dependency::Enum("CounterState".into())));
        assert!(ticket_group.dependencies.contains(&Dependency::Timestamp));
    }

    #[test]
    fn test_composition_embeds_reference_and_merges_inline_members() {
        let doc = queue_document();
        let ctx = context();
        let emitter = DtoEmitter::new(&doc, &ctx);
        let record = emitter.build_record("Ticket", doc.schema("Ticket").unwrap()).unwrap();

        assert_eq!(record.fields.len(), 2);
        let base = &record.fields[0];
        assert!(base.embedded);
        assert_eq!(base.ty.kind(), TypeKind::Composition);
        assert!(!base.ty.nullable);
        assert!(base.validation.is_empty());

        let extra = &record.fields[1];
        assert_eq!(extra.name, "extra");
        assert!(!extra.embedded);
        assert_eq!(extra.validation, vec!["required"]);
        assert!(!record.fields.iter().any(|f| f.name == "id"));
    }

    #[test]
    fn test_field_rules_and_nullability() {
        let doc = queue_document();
        let ctx = context();
        let emitter = DtoEmitter::new(&doc, &ctx);
        let record = emitter.build_record("Counter", doc.schema("Counter").unwrap()).unwrap();
        let field = |name: &str| record.fields.iter().find(|f| f.name == name).unwrap();

        assert_eq!(field("name").validation, vec!["max=32", "required"]);
        assert!(!field("name").omit_empty);

        // required booleans are never tagged required
        assert!(field("open").validation.is_empty());
        assert!(!field("open").ty.nullable);

        assert_eq!(field("tickets").validation, vec!["required", "dive"]);
        assert!(!field("tickets").ty.nullable);

        assert_eq!(field("state").ty.kind(), TypeKind::Enum);
        assert!(!field("state").ty.nullable);

        assert!(field("openedAt").ty.nullable);
        assert!(field("openedAt").omit_empty);

        assert_eq!(field("_links").ident, "UnderscoreLinks");
        assert_eq!(field("_links").ty.shape, TypeShape::Primitive(Primitive::Record));
    }

    #[test]
    fn test_map_schema_becomes_alias() {
        let doc = queue_document();
        let ctx = context();
        let record = DtoEmitter::new(&doc, &ctx)
            .build_record("Labels", doc.schema("Labels").unwrap())
            .unwrap();
        assert!(record.fields.is_empty());
        assert_eq!(record.alias.unwrap().name(), "map<string>");
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let doc = document(json!({
            "paths": {},
            "components": {"schemas": {"Orphan": {"type": "object"}}}
        }));
        let ctx = context();
        let err = DtoEmitter::new(&doc, &ctx).emit().unwrap_err();
        assert!(matches!(err, GenerationError::MissingGroup(ref name) if name == "Orphan"));
    }

    #[test]
    fn test_skip_set_is_configurable() {
        let doc = document(json!({
            "paths": {},
            "components": {"schemas": {
                "Orphan": {"type": "object"},
                "Page": {"type": "object", "x-group": "paging"}
            }}
        }));
        let ctx = context().with_skipped_schemas(["Orphan"]);
        let output = DtoEmitter::new(&doc, &ctx).emit().unwrap();
        assert_eq!(output.groups.len(), 1);
        assert_eq!(output.groups[0].records[0].name, "Page");
    }

    #[test]
    fn test_xml_bindings() {
        let doc = document(json!({
            "paths": {},
            "components": {"schemas": {"Receipt": {
                "type": "object",
                "x-group": "print",
                "xml": {"name": "receipt", "prefix": "q"},
                "properties": {
                    "number": {"type": "string", "xml": {"attribute": true}},
                    "counter": {"type": "string"}
                }
            }}}
        }));
        let ctx = context();
        let record = DtoEmitter::new(&doc, &ctx)
            .build_record("Receipt", doc.schema("Receipt").unwrap())
            .unwrap();
        let root = record.xml_root.unwrap();
        assert_eq!(root.name, "receipt");
        assert_eq!(root.prefix.as_deref(), Some("q"));
        let number = record.fields.iter().find(|f| f.name == "number").unwrap();
        assert!(number.xml.as_ref().unwrap().attribute);
        let counter = record.fields.iter().find(|f| f.name == "counter").unwrap();
        assert_eq!(counter.xml.as_ref().unwrap().name, "counter");
    }
}
