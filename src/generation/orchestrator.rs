//! Generation orchestration - coordinates the generation workflow

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::generation::catalog::build_error_catalog;
use crate::generation::dto::DtoEmitter;
use crate::generation::endpoints::EndpointClassifier;
use crate::generation::handlers::emit_handlers;
use crate::generation::routes::build_route_table;
use crate::generation::{
    ApiDocument, GenerationContext, GenerationError, GenerationResult, PostProcessor,
    ServiceModel, ServiceRenderer,
};

/// Run every semantic stage over a document.
///
/// Pure and synchronous; the first hard error aborts compilation.
pub fn compile(document: &ApiDocument, context: &GenerationContext) -> Result<ServiceModel, GenerationError> {
    let dto = DtoEmitter::new(document, context).emit()?;
    let endpoints = EndpointClassifier::new(document).classify()?;
    let handlers = emit_handlers(&endpoints);
    let routes = build_route_table(&endpoints);
    let errors = build_error_catalog(document)?;

    tracing::debug!(
        groups = dto.groups.len(),
        enums = dto.enums.len(),
        endpoints = endpoints.len(),
        packages = handlers.packages.len(),
        "compiled service model"
    );

    Ok(ServiceModel {
        module: context.module.clone(),
        groups: dto.groups,
        enums: dto.enums,
        endpoints,
        handler_packages: handlers.packages,
        routes,
        needs_construction: handlers.needs_construction,
        errors,
    })
}

/// Orchestrates the code generation workflow
pub struct GenerationOrchestrator {
    renderer: Arc<dyn ServiceRenderer>,
    post_processor: Arc<dyn PostProcessor>,
}

impl GenerationOrchestrator {
    /// Create a new generation orchestrator
    pub fn new(renderer: Arc<dyn ServiceRenderer>, post_processor: Arc<dyn PostProcessor>) -> Self {
        Self {
            renderer,
            post_processor,
        }
    }

    /// Execute the generation workflow, staging every artifact in memory
    pub async fn generate(
        &self,
        document: &ApiDocument,
        context: &GenerationContext,
    ) -> Result<GenerationResult, GenerationError> {
        // 1. Validate context
        context.validate()?;
        if context.language != self.renderer.language() {
            return Err(GenerationError::UnsupportedLanguage(context.language.to_string()));
        }

        // 2. Compile the semantic model
        let model = compile(document, context)?;

        // 3. Render
        let artifacts = self.renderer.render(&model, context)?;

        // 4. Post-process artifacts
        let mut artifacts = self.post_processor.process(artifacts, context).await?;

        // 5. Every path exactly once, in a stable order
        artifacts.sort_by(|a, b| a.path.cmp(&b.path));
        let mut seen = BTreeSet::new();
        for artifact in &artifacts {
            if !seen.insert(artifact.path.clone()) {
                return Err(GenerationError::RenderError(format!(
                    "{} rendered more than once",
                    artifact.path.display()
                )));
            }
        }

        tracing::debug!(artifacts = artifacts.len(), "generation staged");

        Ok(GenerationResult {
            artifacts,
            metadata: context.metadata.clone(),
        })
    }
}
