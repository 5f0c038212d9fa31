//! Parameter planner
//!
//! Merges path-level and operation-level declarations into typed
//! [`ParamSpec`]s and turns them into ordered [`ExtractionStep`]s.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::generation::resolver::primitive_for;
use crate::generation::utils::to_camel_case;
use crate::generation::{
    ApiDocument, ExtractionStep, GenerationError, Parameter, ParameterLocation, ParamScope,
    ParamSpec, Primitive, SchemaRef, ValueKind,
};

/// Query parameters consumed by the paging middleware on paged endpoints
pub const PAGE_QUERY_PARAMS: [&str; 3] = ["page", "size", "sort"];

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("valid regex"));

/// Path and query parameters of one operation, each in declared order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPlan {
    pub path_params: Vec<ParamSpec>,
    pub query_params: Vec<ParamSpec>,
}

pub struct ParameterPlanner<'a> {
    document: &'a ApiDocument,
}

impl<'a> ParameterPlanner<'a> {
    pub fn new(document: &'a ApiDocument) -> Self {
        Self { document }
    }

    /// Merge declarations, operation level first, and check them against the path template
    pub fn plan(
        &self,
        operation: &str,
        path: &str,
        path_level: &[Parameter],
        operation_level: &[Parameter],
        paged: bool,
    ) -> Result<ParameterPlan, GenerationError> {
        let mut seen = BTreeSet::new();
        let mut locals: BTreeMap<String, String> = BTreeMap::new();
        let mut plan = ParameterPlan::default();

        for parameter in operation_level.iter().chain(path_level) {
            let scope = match parameter.location {
                ParameterLocation::Path => ParamScope::Path,
                ParameterLocation::Query => ParamScope::Query,
                ParameterLocation::Header | ParameterLocation::Cookie => {
                    tracing::debug!(operation, parameter = %parameter.name, "ignoring header/cookie parameter");
                    continue;
                }
            };

            if paged && scope == ParamScope::Query && PAGE_QUERY_PARAMS.contains(&parameter.name.as_str()) {
                continue;
            }

            if !seen.insert(parameter.name.clone()) {
                return Err(GenerationError::DuplicateParameter {
                    operation: operation.to_string(),
                    name: parameter.name.clone(),
                });
            }

            if scope == ParamScope::Path && !parameter.required {
                return Err(GenerationError::OptionalPathParameter {
                    operation: operation.to_string(),
                    name: parameter.name.clone(),
                });
            }

            let ident = to_camel_case(&parameter.name);
            if let Some(first) = locals.insert(ident.clone(), parameter.name.clone()) {
                return Err(GenerationError::ParameterIdentifierCollision {
                    operation: operation.to_string(),
                    first,
                    second: parameter.name.clone(),
                    ident,
                });
            }

            let spec = ParamSpec {
                name: parameter.name.clone(),
                ident,
                scope,
                kind: self.value_kind(parameter.schema.as_ref())?,
                required: parameter.required,
            };

            match scope {
                ParamScope::Path => plan.path_params.push(spec),
                ParamScope::Query => plan.query_params.push(spec),
            }
        }

        let template = placeholders(path);
        for name in &template {
            if !plan.path_params.iter().any(|p| &p.name == name) {
                return Err(GenerationError::MissingPathParameter {
                    operation: operation.to_string(),
                    name: name.clone(),
                });
            }
        }
        for param in &plan.path_params {
            if !template.contains(&param.name) {
                tracing::warn!(operation, parameter = %param.name, "path parameter does not appear in the path template");
            }
        }

        Ok(plan)
    }

    /// Value kind of a parameter schema
    pub fn value_kind(&self, schema: Option<&SchemaRef>) -> Result<ValueKind, GenerationError> {
        let Some(schema) = schema else {
            return Ok(ValueKind::Unsupported("none".to_string()));
        };
        let resolved = self.document.resolve(schema)?;

        let Some(schema_type) = resolved.schema_type.as_deref() else {
            return Ok(ValueKind::Unsupported("untyped".to_string()));
        };

        if schema_type == "array" {
            let Some(items) = resolved.items.as_deref() else {
                return Ok(ValueKind::Unsupported("array:".to_string()));
            };
            let items = self.document.resolve(items)?;
            let item_type = items.schema_type.as_deref().unwrap_or_default();
            return Ok(match primitive_for(item_type, items.format.as_deref()) {
                _ if item_type != "string" && item_type != "integer" => {
                    ValueKind::Unsupported(format!("array:{item_type}"))
                }
                Primitive::String => ValueKind::StringArray,
                Primitive::Int32 => ValueKind::Int32Array,
                Primitive::Int64 => ValueKind::Int64Array,
                _ => ValueKind::Unsupported(format!(
                    "array:{item_type}:{}",
                    items.format.as_deref().unwrap_or_default()
                )),
            });
        }

        if schema_type == "object" {
            return Ok(ValueKind::Unsupported("object".to_string()));
        }

        Ok(match primitive_for(schema_type, resolved.format.as_deref()) {
            Primitive::String => ValueKind::String,
            Primitive::Int32 => ValueKind::Int32,
            Primitive::Int64 => ValueKind::Int64,
            Primitive::Boolean => ValueKind::Boolean,
            Primitive::Date => ValueKind::Date,
            Primitive::DateTime => ValueKind::DateTime,
            _ => ValueKind::Unsupported(format!(
                "{schema_type}:{}",
                resolved.format.as_deref().unwrap_or_default()
            )),
        })
    }
}

/// Placeholder names of a path template, in order
pub fn placeholders(path: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(path)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Whether the extraction helpers cover this kind in this scope
pub fn is_supported(scope: ParamScope, kind: &ValueKind) -> bool {
    match (scope, kind) {
        (_, ValueKind::Unsupported(_)) => false,
        (ParamScope::Path, ValueKind::Date) => false,
        (ParamScope::Path, kind) if kind.is_array() => false,
        _ => true,
    }
}

/// Extraction steps in declared order, path parameters first.
///
/// Kinds the helpers cannot coerce fall back to string extraction.
pub fn extraction_steps(
    operation: &str,
    path_params: &[ParamSpec],
    query_params: &[ParamSpec],
) -> Vec<ExtractionStep> {
    path_params
        .iter()
        .chain(query_params)
        .map(|param| {
            let kind = if is_supported(param.scope, &param.kind) {
                param.kind.clone()
            } else {
                tracing::warn!(
                    operation,
                    parameter = %param.name,
                    kind = ?param.kind,
                    "unsupported parameter kind, falling back to string extraction"
                );
                ValueKind::String
            };
            let fallible = !matches!(kind, ValueKind::String | ValueKind::StringArray);
            ExtractionStep {
                param: param.clone(),
                kind,
                fallible,
            }
        })
        .collect()
}
