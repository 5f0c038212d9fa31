//! Go-specific context builder for code generation
//!
//! Turns the target-agnostic [`ServiceModel`] into flat view models the Go
//! templates can print without further decisions: type spellings, struct
//! tags, import lists and helper names are all computed here.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::generation::utils::{lower_first, sanitize_go_identifier};
use crate::generation::{
    BodyDecode, CallArgument, Dependency, EnumBase, EnumDefinition, ErrorCatalog, ExtractionStep,
    Field, GenerationError, Group, HandlerPackage, HandlerPlan, ParamScope, Primitive, Record,
    ResolvedType, ResponseWrite, Route, RouteTable, ServiceModel, TypeShape, ValueKind,
};

/// Qualifier for types living in the DTO package
const DTO_QUALIFIER: &str = "dto.";

/// Sentinel of integer-backed enums; negative literals never normalize to an identifier
const INT_UNKNOWN_VALUE: &str = "-1";

#[derive(Debug, Clone, Serialize)]
pub struct GoFieldView {
    pub ident: String,
    pub embedded: bool,
    /// Declared type, with `*` when nullable
    pub go_type: String,
    /// Type returned by the getter
    pub value_type: String,
    pub pointer: bool,
    /// Struct tag content without backticks
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoRecordView {
    pub name: String,
    pub comment: Vec<String>,
    pub receiver: String,
    pub alias: Option<String>,
    pub xml_name: Option<String>,
    pub fields: Vec<GoFieldView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoGroupView {
    pub name: String,
    pub std_imports: Vec<String>,
    pub module_imports: Vec<String>,
    pub records: Vec<GoRecordView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoEnumValueView {
    pub ident: String,
    /// Go expression of the literal
    pub value: String,
    /// Quoted text returned by `String()`
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoEnumView {
    pub name: String,
    pub package: String,
    pub comment: Vec<String>,
    pub base_type: String,
    pub string_backed: bool,
    pub unknown_value: String,
    pub values: Vec<GoEnumValueView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoExtractionView {
    pub var: String,
    pub helper: String,
    pub name: String,
    pub fallible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoBodyView {
    /// Statement declaring `req`
    pub declaration: String,
    /// `none`, `single` or `each`
    pub validate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoHandlerView {
    pub method_name: String,
    pub route: String,
    pub extractions: Vec<GoExtractionView>,
    pub body: Option<GoBodyView>,
    pub arguments: Vec<String>,
    /// `json`, `page` or `status`
    pub response: String,
    pub status: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoHandlerPackageView {
    pub name: String,
    pub std_imports: Vec<String>,
    pub module_imports: Vec<String>,
    pub handlers: Vec<GoHandlerView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoRouteView {
    pub method: String,
    pub path: String,
    pub handler: String,
    pub paged: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoRegisterView {
    pub module: String,
    pub packages: Vec<String>,
    pub needs_authorization: bool,
    pub needs_paging: bool,
    pub public: Vec<GoRouteView>,
    pub protected: Vec<GoRouteView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoErrorView {
    pub ident: String,
    pub code: String,
    pub comment: Vec<String>,
    pub parameters: String,
    pub message: String,
    pub status: u16,
    pub values: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoErrorsView {
    pub needs_fmt: bool,
    pub errors: Vec<GoErrorView>,
}

/// Builds Go view models from the service model
pub struct GoContextBuilder<'a> {
    module: &'a str,
}

impl<'a> GoContextBuilder<'a> {
    pub fn new(model: &'a ServiceModel) -> Self {
        Self {
            module: &model.module,
        }
    }

    fn dto_import(&self) -> String {
        format!("{}/internal/data/dto", self.module)
    }

    fn enum_import(&self, name: &str) -> String {
        format!("{}/internal/data/dto/{}", self.module, name.to_lowercase())
    }

    pub fn group(&self, group: &Group) -> GoGroupView {
        let mut std_imports = BTreeSet::new();
        let mut module_imports = BTreeSet::new();

        for dependency in &group.dependencies {
            match dependency {
                Dependency::Timestamp => {
                    std_imports.insert("time".to_string());
                }
                Dependency::Enum(name) => {
                    module_imports.insert(self.enum_import(name));
                }
            }
        }
        if group.records.iter().any(|record| record.xml_root.is_some()) {
            std_imports.insert("encoding/xml".to_string());
        }

        GoGroupView {
            name: group.name.clone(),
            std_imports: std_imports.into_iter().collect(),
            module_imports: module_imports.into_iter().collect(),
            records: group.records.iter().map(record_view).collect(),
        }
    }

    pub fn enumeration(&self, definition: &EnumDefinition) -> GoEnumView {
        let base_type = match definition.base {
            EnumBase::String => "string",
            EnumBase::Int32 => "int32",
            EnumBase::Int64 => "int64",
        };

        GoEnumView {
            name: definition.name.clone(),
            package: definition.package.clone(),
            comment: comment_lines(definition.description.as_deref()),
            base_type: base_type.to_string(),
            string_backed: definition.is_string_backed,
            unknown_value: if definition.is_string_backed {
                go_string("UNKNOWN_VALUE")
            } else {
                INT_UNKNOWN_VALUE.to_string()
            },
            values: definition
                .values
                .iter()
                .map(|value| GoEnumValueView {
                    ident: value.ident.clone(),
                    value: if definition.is_string_backed {
                        go_string(&value.literal)
                    } else {
                        value.literal.clone()
                    },
                    text: go_string(&value.literal),
                })
                .collect(),
        }
    }

    pub fn handler_package(&self, package: &HandlerPackage) -> Result<GoHandlerPackageView, GenerationError> {
        let mut std_imports = BTreeSet::from(["net/http".to_string()]);
        let mut module_imports = BTreeSet::new();
        let mut handlers = Vec::with_capacity(package.handlers.len());

        for plan in &package.handlers {
            let view = handler_view(plan)?;

            if !view.extractions.is_empty() || view.response != "status" {
                module_imports.insert(format!("{}/internal/rest/handler", self.module));
            }
            if let Some(body) = &plan.body {
                std_imports.insert("encoding/json".to_string());
                match body {
                    BodyDecode::Record(_) | BodyDecode::RecordList(_) => {
                        module_imports.insert(self.dto_import());
                        module_imports.insert(format!("{}/internal/rest/handler", self.module));
                    }
                    BodyDecode::Value(ty) => self.type_imports(ty, &mut std_imports, &mut module_imports),
                }
            }
            handlers.push(view);
        }

        module_imports.insert(format!("{}/internal/service/{}", self.module, package.name));

        Ok(GoHandlerPackageView {
            name: package.name.clone(),
            std_imports: std_imports.into_iter().collect(),
            module_imports: module_imports.into_iter().collect(),
            handlers,
        })
    }

    /// Imports a handler-side spelling of `ty` needs
    fn type_imports(&self, ty: &ResolvedType, std_imports: &mut BTreeSet<String>, module_imports: &mut BTreeSet<String>) {
        for dependency in &ty.imports {
            match dependency {
                Dependency::Timestamp => {
                    std_imports.insert("time".to_string());
                }
                Dependency::Enum(name) => {
                    module_imports.insert(self.enum_import(name));
                }
            }
        }
        if uses_dto_package(ty) {
            module_imports.insert(self.dto_import());
        }
    }

    pub fn register(&self, routes: &RouteTable) -> GoRegisterView {
        GoRegisterView {
            module: self.module.to_string(),
            packages: routes.packages.clone(),
            needs_authorization: routes.needs_authorization(),
            needs_paging: routes.needs_paging(),
            public: routes.public.iter().map(route_view).collect(),
            protected: routes.protected.iter().map(route_view).collect(),
        }
    }

    pub fn errors(&self, catalog: &ErrorCatalog) -> GoErrorsView {
        let errors: Vec<GoErrorView> = catalog
            .entries
            .iter()
            .map(|entry| {
                let mut parameters = Vec::new();
                if entry.has_values {
                    parameters.push("values map[string]any");
                }
                if entry.is_format {
                    parameters.push("args ...any");
                }

                let mut comment = vec![format!("{} {}", entry.ident, entry.message)];
                comment.extend(comment_lines(entry.description.as_deref()));

                GoErrorView {
                    ident: entry.ident.clone(),
                    code: go_string(&entry.code),
                    comment,
                    parameters: parameters.join(", "),
                    message: if entry.is_format {
                        format!("fmt.Sprintf({}, args...)", go_string(&entry.message))
                    } else {
                        go_string(&entry.message)
                    },
                    status: entry.http_status,
                    values: if entry.has_values { "values" } else { "nil" }.to_string(),
                }
            })
            .collect();

        GoErrorsView {
            needs_fmt: catalog.entries.iter().any(|entry| entry.is_format),
            errors,
        }
    }
}

fn record_view(record: &Record) -> GoRecordView {
    let xml_bound = record.xml_root.is_some();
    GoRecordView {
        name: record.name.clone(),
        comment: comment_lines(record.description.as_deref()),
        receiver: sanitize_go_identifier(&lower_first(&record.name)),
        alias: record.alias.as_ref().map(|alias| go_type(alias, "")),
        xml_name: record.xml_root.as_ref().map(|root| qualified_xml_name(root.prefix.as_deref(), &root.name)),
        fields: record.fields.iter().map(|field| field_view(field, xml_bound)).collect(),
    }
}

fn field_view(field: &Field, xml_bound: bool) -> GoFieldView {
    let value_type = go_type(&field.ty, "");
    let pointer = field.ty.nullable && !field.embedded;
    GoFieldView {
        ident: field.ident.clone(),
        embedded: field.embedded,
        go_type: if pointer { format!("*{value_type}") } else { value_type.clone() },
        value_type,
        pointer,
        tag: struct_tag(field, xml_bound),
    }
}

fn struct_tag(field: &Field, xml_bound: bool) -> String {
    let mut tag = format!(
        "json:\"{}{}\"",
        field.serialization_key,
        if field.omit_empty { ",omitempty" } else { "" }
    );
    if !field.validation.is_empty() {
        tag.push_str(&format!(" validate:\"{}\"", field.validation.join(",")));
    }
    if let Some(xml) = &field.xml {
        tag.push_str(&format!(
            " xml:\"{}{}\"",
            qualified_xml_name(xml.prefix.as_deref(), &xml.name),
            if xml.attribute { ",attr" } else { "" }
        ));
    } else if xml_bound {
        tag.push_str(&format!(" xml:\"{}\"", field.serialization_key));
    }
    tag
}

fn qualified_xml_name(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
        _ => name.to_string(),
    }
}

/// Go spelling of a resolved type, without the pointer of a nullable value.
///
/// `qualifier` is prepended to types defined in the DTO package.
pub fn go_type(ty: &ResolvedType, qualifier: &str) -> String {
    match &ty.shape {
        TypeShape::Primitive(primitive) => match primitive {
            Primitive::String => "string".to_string(),
            Primitive::Int32 => "int32".to_string(),
            Primitive::Int64 => "int64".to_string(),
            Primitive::Float32 => "float32".to_string(),
            Primitive::Float64 => "float64".to_string(),
            Primitive::Boolean => "bool".to_string(),
            Primitive::Date => format!("{qualifier}LocalDate"),
            Primitive::Time => format!("{qualifier}LocalTime"),
            Primitive::LocalDateTime => format!("{qualifier}LocalDateTime"),
            Primitive::DateTime => "time.Time".to_string(),
            Primitive::Any => "interface{}".to_string(),
            Primitive::Record => "map[string]interface{}".to_string(),
        },
        TypeShape::Array(element) => format!("[]{}", go_type(element, qualifier)),
        TypeShape::Map(element) => format!("map[string]{}", go_type(element, qualifier)),
        TypeShape::Reference(name) | TypeShape::Composition(name) => format!("{qualifier}{name}"),
        TypeShape::Enum(name) => format!("{}.{name}", name.to_lowercase()),
    }
}

/// Whether the spelling of `ty` outside the DTO package mentions it
fn uses_dto_package(ty: &ResolvedType) -> bool {
    match &ty.shape {
        TypeShape::Primitive(primitive) => matches!(
            primitive,
            Primitive::Date | Primitive::Time | Primitive::LocalDateTime
        ),
        TypeShape::Array(element) | TypeShape::Map(element) => uses_dto_package(element),
        TypeShape::Reference(_) | TypeShape::Composition(_) => true,
        TypeShape::Enum(_) => false,
    }
}

/// Name of the extraction helper for a step
pub fn helper_name(step: &ExtractionStep) -> Result<String, GenerationError> {
    let scope = match step.param.scope {
        ParamScope::Path => "Path",
        ParamScope::Query => "Query",
    };
    let kind = match &step.kind {
        ValueKind::String => "String",
        ValueKind::Int32 => "Int32",
        ValueKind::Int64 => "Int64",
        ValueKind::Boolean => "Bool",
        ValueKind::Date => "LocalDate",
        ValueKind::DateTime => "DateTime",
        ValueKind::StringArray => "ArrayString",
        ValueKind::Int32Array => "ArrayInt32",
        ValueKind::Int64Array => "ArrayInt64",
        ValueKind::Unsupported(descriptor) => {
            return Err(GenerationError::RenderError(format!(
                "no extraction helper for {descriptor} parameter {}",
                step.param.name
            )));
        }
    };
    let optional = step.param.scope == ParamScope::Query && !step.param.required && !step.kind.is_array();
    Ok(format!(
        "{scope}{}ParamTo{kind}",
        if optional { "Optional" } else { "" }
    ))
}

fn handler_view(plan: &HandlerPlan) -> Result<GoHandlerView, GenerationError> {
    let extractions = plan
        .extractions
        .iter()
        .map(|step| -> Result<_, GenerationError> {
            Ok(GoExtractionView {
                var: sanitize_go_identifier(&step.param.ident),
                helper: helper_name(step)?,
                name: step.param.name.clone(),
                fallible: step.fallible,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let body = plan.body.as_ref().map(|body| match body {
        BodyDecode::Record(name) => GoBodyView {
            declaration: format!("req := {DTO_QUALIFIER}{name}{{}}"),
            validate: "single".to_string(),
        },
        BodyDecode::RecordList(name) => GoBodyView {
            declaration: format!("req := []{DTO_QUALIFIER}{name}{{}}"),
            validate: "each".to_string(),
        },
        BodyDecode::Value(ty) => GoBodyView {
            declaration: format!("var req {}", go_type(ty, DTO_QUALIFIER)),
            validate: "none".to_string(),
        },
    });

    let arguments = plan
        .arguments
        .iter()
        .map(|argument| match argument {
            CallArgument::Context => "r.Context()".to_string(),
            CallArgument::Body => match plan.body {
                Some(BodyDecode::Record(_)) => "&req".to_string(),
                _ => "req".to_string(),
            },
            CallArgument::Param(ident) => sanitize_go_identifier(ident),
            CallArgument::Page => "page".to_string(),
            CallArgument::Size => "size".to_string(),
            CallArgument::Sort => "sort".to_string(),
        })
        .collect();

    let (response, status) = match plan.response {
        ResponseWrite::Json { status } => ("json", status),
        ResponseWrite::Page { status } => ("page", status),
        ResponseWrite::Status { status } => ("status", status),
    };

    Ok(GoHandlerView {
        method_name: plan.method_name.clone(),
        route: plan.route.clone(),
        extractions,
        body,
        arguments,
        response: response.to_string(),
        status,
    })
}

fn route_view(route: &Route) -> GoRouteView {
    GoRouteView {
        method: route.method.display_name().to_string(),
        path: route.path.clone(),
        handler: format!("{}Handler.{}", route.package, route.handler),
        paged: route.paged,
    }
}

/// Go string literal
pub fn go_string(text: &str) -> String {
    // JSON string escapes are a subset of Go's interpreted string literal escapes
    serde_json::to_string(text).unwrap_or_else(|_| format!("{text:?}"))
}

fn comment_lines(text: Option<&str>) -> Vec<String> {
    text.map(|text| {
        text.lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{ParamSpec, XmlBinding, XmlRoot};

    fn field(name: &str, ty: ResolvedType, validation: &[&str], omit_empty: bool) -> Field {
        Field {
            name: name.to_string(),
            ident: crate::generation::utils::to_public_identifier(name),
            ty,
            validation: validation.iter().map(|s| s.to_string()).collect(),
            serialization_key: name.to_string(),
            omit_empty,
            embedded: false,
            xml: None,
        }
    }

    #[test]
    fn test_go_type_spellings() {
        let nested = ResolvedType::map(ResolvedType::map(ResolvedType::primitive(Primitive::String, false)));
        assert_eq!(go_type(&nested, ""), "map[string]map[string]string");

        let dates = ResolvedType::array(ResolvedType::primitive(Primitive::Date, false));
        assert_eq!(go_type(&dates, DTO_QUALIFIER), "[]dto.LocalDate");

        let status = ResolvedType::enumeration("TicketStatus", false);
        assert_eq!(go_type(&status, DTO_QUALIFIER), "ticketstatus.TicketStatus");

        assert_eq!(go_type(&ResolvedType::reference("Ticket"), ""), "Ticket");
        assert_eq!(go_type(&ResolvedType::primitive(Primitive::Record, true), ""), "map[string]interface{}");
    }

    #[test]
    fn test_struct_tags() {
        let required = field("name", ResolvedType::primitive(Primitive::String, false), &["max=20", "required"], false);
        assert_eq!(struct_tag(&required, false), r#"json:"name" validate:"max=20,required""#);

        let optional = field("note", ResolvedType::primitive(Primitive::String, true), &[], true);
        assert_eq!(struct_tag(&optional, true), r#"json:"note,omitempty" xml:"note""#);

        let mut attribute = field("id", ResolvedType::primitive(Primitive::Int64, false), &[], false);
        attribute.xml = Some(XmlBinding {
            name: "ID".to_string(),
            prefix: Some("q".to_string()),
            attribute: true,
        });
        assert_eq!(struct_tag(&attribute, true), r#"json:"id" xml:"q:ID,attr""#);
    }

    #[test]
    fn test_record_view_pointers_and_receiver() {
        let record = Record {
            name: "Type".to_string(),
            description: Some("Ticket type\n\nwith details".to_string()),
            fields: vec![
                field("label", ResolvedType::primitive(Primitive::String, true), &[], true),
                field("owner", ResolvedType::reference("User"), &["required"], false),
            ],
            xml_root: Some(XmlRoot {
                name: "type".to_string(),
                prefix: None,
            }),
            alias: None,
        };

        let view = record_view(&record);
        assert_eq!(view.receiver, "typeParam");
        assert_eq!(view.comment, vec!["Ticket type", "with details"]);
        assert_eq!(view.xml_name.as_deref(), Some("type"));
        assert_eq!(view.fields[0].go_type, "*string");
        assert_eq!(view.fields[0].value_type, "string");
        assert_eq!(view.fields[1].go_type, "*User");
    }

    #[test]
    fn test_helper_names() {
        let step = |scope, kind: ValueKind, required| ExtractionStep {
            param: ParamSpec {
                name: "x".to_string(),
                ident: "x".to_string(),
                scope,
                kind: kind.clone(),
                required,
            },
            fallible: kind != ValueKind::String,
            kind,
        };

        assert_eq!(helper_name(&step(ParamScope::Path, ValueKind::Int64, true)).unwrap(), "PathParamToInt64");
        assert_eq!(helper_name(&step(ParamScope::Query, ValueKind::Int32, false)).unwrap(), "QueryOptionalParamToInt32");
        assert_eq!(helper_name(&step(ParamScope::Query, ValueKind::String, true)).unwrap(), "QueryParamToString");
        assert_eq!(helper_name(&step(ParamScope::Query, ValueKind::Int64Array, false)).unwrap(), "QueryParamToArrayInt64");
        assert_eq!(helper_name(&step(ParamScope::Query, ValueKind::Date, true)).unwrap(), "QueryParamToLocalDate");
        assert!(helper_name(&step(ParamScope::Query, ValueKind::Unsupported("number:".into()), true)).is_err());
    }

    #[test]
    fn test_go_string_escapes() {
        assert_eq!(go_string("plain"), "\"plain\"");
        assert_eq!(go_string("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
    }
}
