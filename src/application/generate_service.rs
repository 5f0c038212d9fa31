//! Use case for generating service scaffolding

use std::sync::Arc;

use crate::application::{
    ApplicationError, GenerateServiceRequest, GenerateServiceResponse, OutputService,
    PostCommandService,
};
use crate::generation::{GenerationContext, GenerationOrchestrator, OpenApiLoader};

/// Use case for generating service scaffolding
pub struct GenerateServiceUseCase {
    openapi_loader: Arc<dyn OpenApiLoader>,
    generation_orchestrator: Arc<GenerationOrchestrator>,
    output_service: Arc<dyn OutputService>,
    command_service: Arc<dyn PostCommandService>,
}

impl GenerateServiceUseCase {
    pub fn new(
        openapi_loader: Arc<dyn OpenApiLoader>,
        generation_orchestrator: Arc<GenerationOrchestrator>,
        output_service: Arc<dyn OutputService>,
        command_service: Arc<dyn PostCommandService>,
    ) -> Self {
        Self {
            openapi_loader,
            generation_orchestrator,
            output_service,
            command_service,
        }
    }

    pub async fn execute(
        &self,
        request: GenerateServiceRequest,
    ) -> Result<GenerateServiceResponse, ApplicationError> {
        // 1. Validate request
        request.validate()?;

        // 2. Load the description
        let document = self.openapi_loader.load(&request.source).await?;
        tracing::info!(
            source = %request.source,
            title = %document.info.title,
            schemas = document.schemas.len(),
            "loaded OpenAPI description"
        );

        // 3. Build generation context
        let context = GenerationContext::for_document(&document, request.language, request.module.as_deref())?
            .with_skipped_schemas(request.skipped_schemas.iter().cloned());

        // 4. Compile and render everything in memory
        let result = self.generation_orchestrator.generate(&document, &context).await?;
        let artifacts: Vec<_> = result.artifacts.iter().map(|a| a.path.clone()).collect();

        if request.dry_run {
            tracing::info!(artifacts = artifacts.len(), "dry run, nothing written");
            return Ok(GenerateServiceResponse {
                artifacts,
                output_path: request.working_dir,
                written: false,
                failed_commands: Vec::new(),
                metadata: result.metadata,
            });
        }

        // 5. Write all artifacts at once
        self.output_service
            .ensure_directory(&request.working_dir)
            .await?;
        self.output_service
            .write_artifacts(&request.working_dir, &result.artifacts)
            .await?;
        tracing::info!(
            artifacts = artifacts.len(),
            dir = %request.working_dir.display(),
            "generated service scaffolding"
        );

        // 6. Post-generation commands
        let failed_commands = if request.post_commands.is_empty() {
            Vec::new()
        } else {
            self.command_service
                .run_commands(&request.post_commands, &request.working_dir)
                .await
                .into_iter()
                .filter(|outcome| !outcome.succeeded)
                .map(|outcome| outcome.command)
                .collect()
        };

        Ok(GenerateServiceResponse {
            artifacts,
            output_path: request.working_dir,
            written: true,
            failed_commands,
            metadata: result.metadata,
        })
    }
}
