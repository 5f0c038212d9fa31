//! Target-agnostic semantic model produced by the compiler stages
//!
//! Nothing in here knows about Go. Renderers turn a [`ServiceModel`] into files.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::generation::HttpMethod;

/// Scalar and opaque value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Primitive {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    /// Calendar date without time
    Date,
    /// Wall-clock time without date
    Time,
    /// Date and time without zone
    LocalDateTime,
    /// Instant with zone
    DateTime,
    /// Untyped value
    Any,
    /// Generic string-keyed record
    Record,
}

impl Primitive {
    /// Numeric and boolean values always carry a zero value, so they never get a `required` rule
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Primitive::Int32
                | Primitive::Int64
                | Primitive::Float32
                | Primitive::Float64
                | Primitive::Boolean
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Boolean => "boolean",
            Primitive::Date => "date",
            Primitive::Time => "time",
            Primitive::LocalDateTime => "local-date-time",
            Primitive::DateTime => "date-time",
            Primitive::Any => "any",
            Primitive::Record => "record",
        }
    }
}

/// Cross-group dependency a resolved type drags into the file using it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dependency {
    /// The enum's own package
    Enum(String),
    /// The target's timestamp library
    Timestamp,
}

/// Projection of [`TypeShape`] without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Primitive,
    Array,
    Map,
    Reference,
    Enum,
    Composition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeShape {
    Primitive(Primitive),
    Array(Box<ResolvedType>),
    /// String-keyed map
    Map(Box<ResolvedType>),
    /// Record defined by a component schema
    Reference(String),
    /// Enum defined by a component schema
    Enum(String),
    /// Component embedded into the declaring record
    Composition(String),
}

/// A schema's type after resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedType {
    pub shape: TypeShape,
    pub nullable: bool,
    pub imports: BTreeSet<Dependency>,
}

impl ResolvedType {
    pub fn primitive(primitive: Primitive, nullable: bool) -> Self {
        let mut imports = BTreeSet::new();
        if primitive == Primitive::DateTime {
            imports.insert(Dependency::Timestamp);
        }
        Self {
            shape: TypeShape::Primitive(primitive),
            nullable,
            imports,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            shape: TypeShape::Reference(name.into()),
            nullable: true,
            imports: BTreeSet::new(),
        }
    }

    pub fn enumeration(name: impl Into<String>, nullable: bool) -> Self {
        let name = name.into();
        Self {
            imports: BTreeSet::from([Dependency::Enum(name.clone())]),
            shape: TypeShape::Enum(name),
            nullable,
        }
    }

    pub fn composition(name: impl Into<String>) -> Self {
        Self {
            shape: TypeShape::Composition(name.into()),
            nullable: false,
            imports: BTreeSet::new(),
        }
    }

    pub fn array(element: ResolvedType) -> Self {
        Self {
            imports: element.imports.clone(),
            shape: TypeShape::Array(Box::new(element)),
            nullable: false,
        }
    }

    pub fn map(element: ResolvedType) -> Self {
        Self {
            imports: element.imports.clone(),
            shape: TypeShape::Map(Box::new(element)),
            nullable: false,
        }
    }

    /// Same type in element position: element types are never nullable
    pub fn as_element(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn kind(&self) -> TypeKind {
        match self.shape {
            TypeShape::Primitive(_) => TypeKind::Primitive,
            TypeShape::Array(_) => TypeKind::Array,
            TypeShape::Map(_) => TypeKind::Map,
            TypeShape::Reference(_) => TypeKind::Reference,
            TypeShape::Enum(_) => TypeKind::Enum,
            TypeShape::Composition(_) => TypeKind::Composition,
        }
    }

    /// Element type of an array or map
    pub fn element(&self) -> Option<&ResolvedType> {
        match &self.shape {
            TypeShape::Array(element) | TypeShape::Map(element) => Some(element),
            _ => None,
        }
    }

    /// Target-agnostic display name, e.g. `list<map<string>>`
    pub fn name(&self) -> String {
        match &self.shape {
            TypeShape::Primitive(primitive) => primitive.name().to_string(),
            TypeShape::Array(element) => format!("list<{}>", element.name()),
            TypeShape::Map(element) => format!("map<{}>", element.name()),
            TypeShape::Reference(name) | TypeShape::Enum(name) | TypeShape::Composition(name) => {
                name.clone()
            }
        }
    }

    /// Whether values of this array type need validating element by element
    pub fn needs_element_validation(&self) -> bool {
        matches!(&self.shape, TypeShape::Array(element) if matches!(element.shape, TypeShape::Reference(_)))
    }

    /// Numeric and boolean primitives
    pub fn is_value_primitive(&self) -> bool {
        matches!(self.shape, TypeShape::Primitive(p) if p.is_value_type())
    }

    /// Referenced record name, if this is a plain record reference
    pub fn reference_name(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Reference(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.name())
        } else {
            write!(f, "{}", self.name())
        }
    }
}

/// XML binding of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlBinding {
    pub name: String,
    pub prefix: Option<String>,
    pub attribute: bool,
}

/// One member of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Property name as declared
    pub name: String,
    /// Exported identifier
    pub ident: String,
    pub ty: ResolvedType,
    /// Ordered validation rules
    pub validation: Vec<String>,
    pub serialization_key: String,
    pub omit_empty: bool,
    /// Composed-in member, promoted rather than named
    pub embedded: bool,
    pub xml: Option<XmlBinding>,
}

/// Root element of an XML-bound record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlRoot {
    pub name: String,
    pub prefix: Option<String>,
}

/// A data record emitted for one component schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<Field>,
    pub xml_root: Option<XmlRoot>,
    /// Top-level array schemas become an alias of their list type
    pub alias: Option<ResolvedType>,
}

/// Records sharing one grouping key; one output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub records: Vec<Record>,
    pub dependencies: BTreeSet<Dependency>,
}

/// One literal of an enum and the identifier it normalizes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    pub literal: String,
    pub ident: String,
}

/// Integer width backing a non-string enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnumBase {
    String,
    Int32,
    Int64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDefinition {
    pub name: String,
    /// Sub-package the enum lives in
    pub package: String,
    pub is_string_backed: bool,
    pub base: EnumBase,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
}

/// Visibility of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResponseShape {
    Paged { item: Option<String> },
    ArrayOfRef(String),
    ArrayOfPrimitive(ResolvedType),
    SingleRef(String),
    SinglePrimitive(ResolvedType),
    None,
}

impl ResponseShape {
    pub fn is_paged(&self) -> bool {
        matches!(self, ResponseShape::Paged { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RequestShape {
    None,
    SingleRef(String),
    ArrayOfRef(String),
    PrimitiveOrArray(ResolvedType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamScope {
    Path,
    Query,
}

/// Value kinds the extraction helpers know how to coerce
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    String,
    Int32,
    Int64,
    Boolean,
    Date,
    DateTime,
    StringArray,
    Int32Array,
    Int64Array,
    /// Anything else, carrying its `type:format` descriptor
    Unsupported(String),
}

impl ValueKind {
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            ValueKind::StringArray | ValueKind::Int32Array | ValueKind::Int64Array
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    /// Local variable name in generated code
    pub ident: String,
    pub scope: ParamScope,
    pub kind: ValueKind,
    pub required: bool,
}

/// A classified operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
    pub visibility: Visibility,
    pub package: String,
    pub operation_id: String,
    pub custom_handler: bool,
    pub response: ResponseShape,
    pub request: RequestShape,
    pub path_params: Vec<ParamSpec>,
    pub query_params: Vec<ParamSpec>,
    pub status: u16,
}

impl Endpoint {
    pub fn is_paged(&self) -> bool {
        self.response.is_paged()
    }

    /// `METHOD /path`, used in logs and errors
    pub fn label(&self) -> String {
        format!("{} {}", self.method.display_name().to_uppercase(), self.path)
    }
}

/// Typed extraction of one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionStep {
    pub param: ParamSpec,
    /// Kind actually extracted after any fallback
    pub kind: ValueKind,
    /// Whether coercion can fail and must be checked
    pub fallible: bool,
}

/// How a request body is decoded and validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BodyDecode {
    /// Decode into a record and validate it
    Record(String),
    /// Decode into a list of records and validate each element
    RecordList(String),
    /// Decode only
    Value(ResolvedType),
}

/// One argument of the service call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArgument {
    Context,
    Body,
    Param(String),
    Page,
    Size,
    Sort,
}

/// How the service result is written back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseWrite {
    Json { status: u16 },
    Page { status: u16 },
    Status { status: u16 },
}

/// Request-handling logic for one generated endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerPlan {
    /// Exported method name, shared by the handler and the service
    pub method_name: String,
    pub operation_id: String,
    pub route: String,
    pub extractions: Vec<ExtractionStep>,
    pub body: Option<BodyDecode>,
    pub arguments: Vec<CallArgument>,
    pub response: ResponseWrite,
}

/// All generated handlers of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerPackage {
    pub name: String,
    pub handlers: Vec<HandlerPlan>,
}

impl HandlerPackage {
    pub fn decodes_body(&self) -> bool {
        self.handlers.iter().any(|h| h.body.is_some())
    }

    pub fn has_params(&self) -> bool {
        self.handlers.iter().any(|h| !h.extractions.is_empty())
    }
}

/// One row of the route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub package: String,
    pub handler: String,
    pub paged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    pub public: Vec<Route>,
    pub protected: Vec<Route>,
    /// Every handler package referenced by a route, sorted
    pub packages: Vec<String>,
}

impl RouteTable {
    pub fn needs_authorization(&self) -> bool {
        !self.protected.is_empty()
    }

    pub fn needs_paging(&self) -> bool {
        self.public.iter().chain(&self.protected).any(|route| route.paged)
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.protected.is_empty()
    }
}

/// One application error constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub code: String,
    /// PascalCase constructor name
    pub ident: String,
    pub message: String,
    pub http_status: u16,
    pub has_values: bool,
    /// Message contains `%` verbs
    pub is_format: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCatalog {
    pub entries: Vec<ErrorEntry>,
}

/// Everything a renderer needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceModel {
    pub module: String,
    pub groups: Vec<Group>,
    pub enums: Vec<EnumDefinition>,
    pub endpoints: Vec<Endpoint>,
    pub handler_packages: Vec<HandlerPackage>,
    pub routes: RouteTable,
    /// Packages whose handlers the dependency container must construct
    pub needs_construction: BTreeSet<String>,
    pub errors: Option<ErrorCatalog>,
}
