//! OpenAPI document parser
//!
//! Walks the raw JSON value of a description and builds the [`ApiDocument`]
//! schema graph:
//! - component schema references stay symbolic
//! - parameter, request body and response references are inlined
//! - vendor extensions (`x-*`) are collected on every node that matters for generation

use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

use crate::generation::{
    ApiDocument, ApiInfo, Extensions, GenerationError, HttpMethod, MediaType, Operation,
    Parameter, ParameterLocation, PathItem, RequestBody, Response, SCHEMA_REF_PREFIX, Schema,
    SchemaRef, XmlObject,
};

/// Local (`#/...`) references are followed at most this many times in a chain
const MAX_REF_HOPS: usize = 16;

/// OpenAPI description parser
pub struct OpenApiParser {
    /// The raw JSON value of the description
    pub json: JsonValue,
}

impl OpenApiParser {
    /// Create a new parser from JSON content
    pub fn new(json: JsonValue) -> Self {
        Self { json }
    }

    /// Parse the complete description into the schema graph
    pub fn parse(&self) -> Result<ApiDocument, GenerationError> {
        let version = self
            .json
            .get("openapi")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| GenerationError::ValidationError("Missing OpenAPI version".to_string()))?
            .to_string();

        if !version.starts_with('3') {
            return Err(GenerationError::ValidationError(format!(
                "Unsupported OpenAPI version {version}, expected 3.x"
            )));
        }

        let info = ApiInfo {
            title: self
                .title()
                .ok_or_else(|| GenerationError::ValidationError("Missing info.title".to_string()))?
                .to_string(),
            version: self
                .version()
                .ok_or_else(|| {
                    GenerationError::ValidationError("Missing info.version".to_string())
                })?
                .to_string(),
            description: self
                .json
                .get("info")
                .and_then(|info| info.get("description"))
                .and_then(JsonValue::as_str)
                .map(String::from),
        };

        let paths = self.parse_paths()?;
        tracing::debug!("OpenAPI parser found {} paths", paths.len());

        let schemas = self.parse_component_schemas()?;
        tracing::debug!("OpenAPI parser found {} component schemas", schemas.len());

        let extensions = self
            .json
            .as_object()
            .map(|root| self.extract_vendor_extensions(root))
            .unwrap_or_default();

        Ok(ApiDocument {
            version,
            info,
            paths,
            schemas,
            extensions,
        })
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.json.get("info")?.get("title")?.as_str()
    }

    /// Get the version of the API
    pub fn version(&self) -> Option<&str> {
        self.json.get("info")?.get("version")?.as_str()
    }

    fn parse_paths(&self) -> Result<BTreeMap<String, PathItem>, GenerationError> {
        let paths = self
            .json
            .get("paths")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| {
                GenerationError::ValidationError("Missing 'paths' object".to_string())
            })?;

        paths
            .iter()
            .map(|(path, path_item)| -> Result<_, GenerationError> {
                Ok((path.clone(), self.parse_path_item(path, path_item)?))
            })
            .collect()
    }

    fn parse_path_item(&self, path: &str, path_item: &JsonValue) -> Result<PathItem, GenerationError> {
        let path_item = self.follow_ref(path_item)?;
        let parameters = self.extract_parameters(path_item)?;

        let operations = HttpMethod::all()
            .iter()
            .filter_map(|method| {
                path_item
                    .get(method.to_string())
                    .and_then(JsonValue::as_object)
                    .map(|method_item| (*method, method_item))
            })
            .map(|(method, method_item)| {
                self.build_operation(method_item)
                    .map(|operation| (method, operation))
                    .map_err(|e| match e {
                        GenerationError::ValidationError(reason) => {
                            GenerationError::ValidationError(format!(
                                "{} {path}: {reason}",
                                method.display_name().to_uppercase()
                            ))
                        }
                        other => other,
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(PathItem {
            parameters,
            operations,
        })
    }

    /// Build an Operation from its method item
    fn build_operation(&self, method_item: &Map<String, JsonValue>) -> Result<Operation, GenerationError> {
        let operation_id = method_item
            .get("operationId")
            .and_then(JsonValue::as_str)
            .map(String::from);
        let summary = method_item
            .get("summary")
            .and_then(JsonValue::as_str)
            .map(String::from);
        let description = method_item
            .get("description")
            .and_then(JsonValue::as_str)
            .map(String::from);

        let parameters = self.extract_parameters(&JsonValue::Object(method_item.clone()))?;

        let request_body = method_item
            .get("requestBody")
            .map(|rb| self.parse_request_body(rb))
            .transpose()?;

        let responses = self.extract_responses(method_item)?;
        let extensions = self.extract_vendor_extensions(method_item);

        Ok(Operation {
            operation_id,
            summary,
            description,
            parameters,
            request_body,
            responses,
            extensions,
        })
    }

    /// Extracts the `parameters` list of a path item or operation, resolving `$ref`s
    fn extract_parameters(&self, item: &JsonValue) -> Result<Vec<Parameter>, GenerationError> {
        item.get("parameters")
            .and_then(JsonValue::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|param| self.parse_parameter(self.follow_ref(param)?))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Parse a single parameter
    fn parse_parameter(&self, param: &JsonValue) -> Result<Parameter, GenerationError> {
        let name = param
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| GenerationError::ValidationError("Parameter missing name".to_string()))?
            .to_string();

        let location = match param.get("in").and_then(JsonValue::as_str) {
            Some("path") => ParameterLocation::Path,
            Some("query") => ParameterLocation::Query,
            Some("header") => ParameterLocation::Header,
            Some("cookie") => ParameterLocation::Cookie,
            other => {
                return Err(GenerationError::ValidationError(format!(
                    "Invalid location {other:?} for parameter {name}"
                )));
            }
        };

        let required = param
            .get("required")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        let schema = param
            .get("schema")
            .map(|s| self.parse_schema_ref(s))
            .transpose()?;
        let description = param
            .get("description")
            .and_then(JsonValue::as_str)
            .map(String::from);

        Ok(Parameter {
            name,
            location,
            required,
            schema,
            description,
        })
    }

    /// Parse a request body, resolving a `$ref` if present
    fn parse_request_body(&self, request_body: &JsonValue) -> Result<RequestBody, GenerationError> {
        let request_body = self.follow_ref(request_body)?;
        let required = request_body
            .get("required")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        let content = self.parse_content(request_body)?;

        Ok(RequestBody { required, content })
    }

    /// Extract responses keyed by status code
    fn extract_responses(
        &self,
        method_item: &Map<String, JsonValue>,
    ) -> Result<BTreeMap<String, Response>, GenerationError> {
        let Some(responses) = method_item.get("responses").and_then(JsonValue::as_object) else {
            return Ok(BTreeMap::new());
        };

        responses
            .iter()
            .map(|(status, response)| -> Result<_, GenerationError> {
                let response = self.follow_ref(response)?;
                Ok((
                    status.clone(),
                    Response {
                        description: response
                            .get("description")
                            .and_then(JsonValue::as_str)
                            .map(String::from),
                        content: self.parse_content(response)?,
                    },
                ))
            })
            .collect()
    }

    fn parse_content(&self, node: &JsonValue) -> Result<BTreeMap<String, MediaType>, GenerationError> {
        let Some(content) = node.get("content").and_then(JsonValue::as_object) else {
            return Ok(BTreeMap::new());
        };

        content
            .iter()
            .map(|(content_type, media)| -> Result<_, GenerationError> {
                let schema = media
                    .get("schema")
                    .map(|s| self.parse_schema_ref(s))
                    .transpose()?;
                Ok((content_type.clone(), MediaType { schema }))
            })
            .collect()
    }

    fn parse_component_schemas(&self) -> Result<BTreeMap<String, Schema>, GenerationError> {
        let Some(schemas) = self
            .json
            .get("components")
            .and_then(|components| components.get("schemas"))
            .and_then(JsonValue::as_object)
        else {
            return Ok(BTreeMap::new());
        };

        schemas
            .iter()
            .map(|(name, schema)| -> Result<_, GenerationError> {
                // A bare alias of another component behaves like a single-member composition
                let parsed = match self.parse_schema_ref(schema)? {
                    SchemaRef::Inline(inline) => *inline,
                    reference => Schema {
                        all_of: vec![reference],
                        ..Schema::default()
                    },
                };
                Ok((name.clone(), parsed))
            })
            .collect()
    }

    /// Parse a schema position: a component reference stays symbolic
    fn parse_schema_ref(&self, value: &JsonValue) -> Result<SchemaRef, GenerationError> {
        match value.get("$ref").and_then(JsonValue::as_str) {
            Some(reference) => match reference.strip_prefix(SCHEMA_REF_PREFIX) {
                Some(name) => Ok(SchemaRef::Reference(name.to_string())),
                None => Ok(SchemaRef::inline(self.parse_schema(self.follow_ref(value)?)?)),
            },
            None => Ok(SchemaRef::inline(self.parse_schema(value)?)),
        }
    }

    /// Parse an inline schema object
    fn parse_schema(&self, value: &JsonValue) -> Result<Schema, GenerationError> {
        let object = value.as_object().ok_or_else(|| {
            GenerationError::ValidationError(format!("Schema must be an object, got {value}"))
        })?;

        // OpenAPI 3.1 allows `type: [T, "null"]`
        let schema_type = match object.get("type") {
            Some(JsonValue::String(t)) => Some(t.clone()),
            Some(JsonValue::Array(types)) => types
                .iter()
                .filter_map(JsonValue::as_str)
                .find(|t| *t != "null")
                .map(String::from),
            _ => None,
        };

        let properties = object
            .get("properties")
            .and_then(JsonValue::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| -> Result<_, GenerationError> {
                        Ok((name.clone(), self.parse_schema_ref(prop)?))
                    })
                    .collect::<Result<BTreeMap<_, _>, GenerationError>>()
            })
            .transpose()?
            .unwrap_or_default();

        let required = object
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(JsonValue::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let items = object
            .get("items")
            .map(|items| self.parse_schema_ref(items).map(Box::new))
            .transpose()?;

        let additional_properties = match object.get("additionalProperties") {
            Some(ap @ JsonValue::Object(_)) => Some(Box::new(self.parse_schema_ref(ap)?)),
            _ => None,
        };

        let all_of = object
            .get("allOf")
            .and_then(JsonValue::as_array)
            .map(|members| {
                members
                    .iter()
                    .map(|member| self.parse_schema_ref(member))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let xml = object.get("xml").and_then(JsonValue::as_object).map(|xml| XmlObject {
            name: xml.get("name").and_then(JsonValue::as_str).map(String::from),
            prefix: xml.get("prefix").and_then(JsonValue::as_str).map(String::from),
            attribute: xml
                .get("attribute")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        });

        Ok(Schema {
            schema_type,
            format: object.get("format").and_then(JsonValue::as_str).map(String::from),
            description: object
                .get("description")
                .and_then(JsonValue::as_str)
                .map(String::from),
            properties,
            required,
            items,
            additional_properties,
            enum_values: object
                .get("enum")
                .and_then(JsonValue::as_array)
                .cloned()
                .unwrap_or_default(),
            all_of,
            xml,
            extensions: self.extract_vendor_extensions(object),
        })
    }

    /// Follow local `$ref` chains to the referenced node
    fn follow_ref<'a>(&'a self, mut node: &'a JsonValue) -> Result<&'a JsonValue, GenerationError> {
        for _ in 0..MAX_REF_HOPS {
            let Some(reference) = node.get("$ref").and_then(JsonValue::as_str) else {
                return Ok(node);
            };
            let pointer = reference.strip_prefix('#').ok_or_else(|| {
                GenerationError::LoadError(format!("External reference {reference} is not supported"))
            })?;
            node = self.json.pointer(pointer).ok_or_else(|| {
                GenerationError::unresolvable(reference, "reference target not found")
            })?;
        }

        Err(GenerationError::LoadError(format!(
            "Reference chain longer than {MAX_REF_HOPS} hops"
        )))
    }

    /// Extract vendor extensions (`x-*` fields)
    fn extract_vendor_extensions(&self, object: &Map<String, JsonValue>) -> Extensions {
        object
            .iter()
            .filter(|(key, _)| key.starts_with("x-"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: JsonValue) -> ApiDocument {
        OpenApiParser::new(value).parse().expect("document parses")
    }

    #[test]
    fn test_parse_keeps_component_references_symbolic() {
        let doc = parse(json!({
            "openapi": "3.0.3",
            "info": {"title": "Queue", "version": "1.0.0"},
            "paths": {},
            "components": {"schemas": {
                "Node": {
                    "type": "object",
                    "x-group": "tree",
                    "properties": {
                        "parent": {"$ref": "#/components/schemas/Node"},
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                    }
                }
            }}
        }));

        let node = doc.schema("Node").unwrap();
        assert_eq!(node.properties["parent"], SchemaRef::Reference("Node".into()));
        assert_eq!(node.extensions["x-group"], json!("tree"));
        let items = doc.resolve(&node.properties["children"]).unwrap().items.clone().unwrap();
        assert_eq!(items.reference(), Some("Node"));
    }

    #[test]
    fn test_parse_inlines_parameter_and_response_refs() {
        let doc = parse(json!({
            "openapi": "3.0.3",
            "info": {"title": "Queue", "version": "1.0.0"},
            "paths": {"/tickets/{id}": {
                "parameters": [{"$ref": "#/components/parameters/Id"}],
                "get": {
                    "operationId": "getTicket",
                    "x-generated": {"package": "ticket"},
                    "responses": {"200": {"$ref": "#/components/responses/Ticket"}}
                }
            }},
            "components": {
                "parameters": {"Id": {"name": "id", "in": "path", "required": true, "schema": {"type": "integer", "format": "int64"}}},
                "responses": {"Ticket": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Ticket"}}}}},
                "schemas": {"Ticket": {"type": "object", "x-group": "ticket"}}
            }
        }));

        let item = &doc.paths["/tickets/{id}"];
        assert_eq!(item.parameters.len(), 1);
        assert_eq!(item.parameters[0].location, ParameterLocation::Path);
        let operation = &item.operations[&HttpMethod::Get];
        assert_eq!(operation.operation_id.as_deref(), Some("getTicket"));
        let schema = operation.responses["200"].content["application/json"].schema.clone();
        assert_eq!(schema, Some(SchemaRef::Reference("Ticket".into())));
        assert!(operation.extensions.contains_key("x-generated"));
    }

    #[test]
    fn test_parse_rejects_swagger_two() {
        let result = OpenApiParser::new(json!({
            "openapi": "2.0",
            "info": {"title": "Old", "version": "1"},
            "paths": {}
        }))
        .parse();
        assert!(matches!(result, Err(GenerationError::ValidationError(_))));
    }

    #[test]
    fn test_parse_additional_properties_boolean_is_dropped() {
        let doc = parse(json!({
            "openapi": "3.0.0",
            "info": {"title": "T", "version": "1"},
            "paths": {},
            "components": {"schemas": {
                "Free": {"type": "object", "additionalProperties": true},
                "Typed": {"type": "object", "additionalProperties": {"type": "string"}}
            }}
        }));
        assert!(doc.schema("Free").unwrap().additional_properties.is_none());
        assert!(doc.schema("Typed").unwrap().additional_properties.is_some());
    }

    #[test]
    fn test_parse_unknown_local_reference_fails() {
        let result = OpenApiParser::new(json!({
            "openapi": "3.0.0",
            "info": {"title": "T", "version": "1"},
            "paths": {"/a": {"get": {
                "parameters": [{"$ref": "#/components/parameters/Missing"}],
                "responses": {}
            }}}
        }))
        .parse();
        assert!(matches!(result, Err(GenerationError::UnresolvableSchema { .. })));
    }
}
