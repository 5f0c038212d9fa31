//! Tera-based Go renderer
//!
//! Layout of the rendered tree, relative to the working directory:
//!
//! | artifact | path |
//! |----------|------|
//! | local time types | `internal/data/dto/generated.go` |
//! | DTO group | `internal/data/dto/<group>.go` |
//! | enum package | `internal/data/dto/<lower>/<lower>.go` |
//! | handler package | `internal/rest/handler/<package>/generated.go` |
//! | route table | `internal/rest/register/generated.go` |
//! | error catalog | `internal/errors/custom_generated.go` |

use serde::Serialize;
use tera::{Context, Tera};

use super::context_builders::GoContextBuilder;
use crate::generation::{
    Artifact, GenerationContext, GenerationError, Language, ServiceModel, ServiceRenderer,
};

const DTO_TEMPLATE: &str = "dto.go";
const DTO_TYPES_TEMPLATE: &str = "dto_types.go";
const ENUM_TEMPLATE: &str = "enum.go";
const HANDLER_TEMPLATE: &str = "handler.go";
const REGISTER_TEMPLATE: &str = "register.go";
const ERRORS_TEMPLATE: &str = "errors.go";

const TEMPLATES: &[(&str, &str)] = &[
    (DTO_TEMPLATE, include_str!("../../../templates/go/dto.go.tera")),
    (DTO_TYPES_TEMPLATE, include_str!("../../../templates/go/dto_types.go.tera")),
    (ENUM_TEMPLATE, include_str!("../../../templates/go/enum.go.tera")),
    (HANDLER_TEMPLATE, include_str!("../../../templates/go/handler.go.tera")),
    (REGISTER_TEMPLATE, include_str!("../../../templates/go/register.go.tera")),
    (ERRORS_TEMPLATE, include_str!("../../../templates/go/errors.go.tera")),
];

/// Renders a [`ServiceModel`] as Go sources
pub struct GoServiceRenderer {
    tera: Tera,
}

impl GoServiceRenderer {
    pub fn new() -> Result<Self, GenerationError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        for (name, content) in TEMPLATES {
            tera.add_raw_template(name, content).map_err(|e| {
                GenerationError::RenderError(format!("Failed to add template {name}: {e}"))
            })?;
        }
        Ok(Self { tera })
    }

    fn render_template<T: Serialize>(
        &self,
        template: &str,
        key: &str,
        value: &T,
        module: &str,
    ) -> Result<String, GenerationError> {
        let mut context = Context::new();
        context.insert(key, value);
        context.insert("module", module);
        self.tera.render(template, &context).map_err(|e| {
            GenerationError::RenderError(format!("Failed to render template {template}: {e:?}"))
        })
    }
}

impl ServiceRenderer for GoServiceRenderer {
    fn language(&self) -> Language {
        Language::Go
    }

    fn render(
        &self,
        model: &ServiceModel,
        context: &GenerationContext,
    ) -> Result<Vec<Artifact>, GenerationError> {
        let builder = GoContextBuilder::new(model);
        let module = model.module.as_str();
        let mut artifacts = Vec::new();

        artifacts.push(Artifact::new(
            "internal/data/dto/generated.go",
            self.render_template(DTO_TYPES_TEMPLATE, "metadata", &context.metadata, module)?,
        ));

        for group in &model.groups {
            let view = builder.group(group);
            artifacts.push(Artifact::new(
                format!("internal/data/dto/{}.go", group.name),
                self.render_template(DTO_TEMPLATE, "group", &view, module)?,
            ));
        }

        for definition in &model.enums {
            let view = builder.enumeration(definition);
            artifacts.push(Artifact::new(
                format!(
                    "internal/data/dto/{0}/{0}.go",
                    definition.package
                ),
                self.render_template(ENUM_TEMPLATE, "enum", &view, module)?,
            ));
        }

        for package in &model.handler_packages {
            let view = builder.handler_package(package)?;
            artifacts.push(Artifact::new(
                format!("internal/rest/handler/{}/generated.go", package.name),
                self.render_template(HANDLER_TEMPLATE, "package", &view, module)?,
            ));
        }

        artifacts.push(Artifact::new(
            "internal/rest/register/generated.go",
            self.render_template(REGISTER_TEMPLATE, "register", &builder.register(&model.routes), module)?,
        ));

        if let Some(catalog) = &model.errors {
            artifacts.push(Artifact::new(
                "internal/errors/custom_generated.go",
                self.render_template(ERRORS_TEMPLATE, "errors", &builder.errors(catalog), module)?,
            ));
        }

        tracing::debug!(
            language = %Language::Go,
            artifacts = artifacts.len(),
            "rendered service model"
        );

        Ok(artifacts)
    }
}
