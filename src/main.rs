//! servicegen CLI entrypoint
//! Parses command-line arguments and dispatches to the generate use case.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use servicegen::application::{GenerateServiceRequest, GenerateServiceUseCase, GeneratorConfig};
use servicegen::generation::GenerationOrchestrator;
use servicegen::infrastructure::ShellCommandExecutor;
use servicegen::infrastructure::generation::{CommandRunner, CompositePostProcessor, select_renderer};
use servicegen::infrastructure::openapi::{CompositeOpenApiLoader, is_remote};
use servicegen::infrastructure::output::FileSystemOutputService;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// External imports (alphabetized)
use anyhow::Context;
use clap::{Args, Parser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DESCRIPTION: &str = "open-api.yaml";
const DEFAULT_CONFIG: &str = "servicegen.toml";

#[derive(Parser)]
#[command(name = "servicegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate DTOs, enums, handlers, routes and errors from an OpenAPI description
    Generate {
        #[command(flatten)]
        source: SourceArgs,
        /// Schema name to leave out of DTO generation (repeatable, added to the configured set)
        #[arg(long = "skip-schema")]
        skip_schemas: Vec<String>,
        /// Shell command to run in the working directory after writing (repeatable)
        #[arg(long = "post-command")]
        post_commands: Vec<String>,
        /// Compile and render without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Compile the description and report errors without writing
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Path or URL of the OpenAPI description (YAML or JSON)
    #[arg(long = "open-api", default_value = DEFAULT_DESCRIPTION)]
    open_api: String,
    /// Working directory generated paths are rooted at
    #[arg(long = "wd", default_value = ".")]
    working_dir: PathBuf,
    /// Configuration file, `servicegen.toml` in the working directory when present
    #[arg(long)]
    config: Option<PathBuf>,
    /// Go module path, overriding `x-configuration.module`
    #[arg(long)]
    module: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging, INFO unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            source,
            skip_schemas,
            post_commands,
            dry_run,
        } => {
            let mut request = build_request(&source).await?;
            request.skipped_schemas.extend(skip_schemas);
            request.post_commands.extend(post_commands);
            request.dry_run = dry_run;
            run(request).await
        }
        Commands::Check { source } => {
            let mut request = build_request(&source).await?;
            request.dry_run = true;
            request.post_commands.clear();
            run(request).await
        }
    }
}

/// Merge the configuration file and the source flags into a request
async fn build_request(args: &SourceArgs) -> anyhow::Result<GenerateServiceRequest> {
    let config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .await
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => {
            let implicit = args.working_dir.join(DEFAULT_CONFIG);
            if tokio::fs::try_exists(&implicit).await.unwrap_or(false) {
                GeneratorConfig::load(&implicit)
                    .await
                    .with_context(|| format!("Failed to load configuration {}", implicit.display()))?
            } else {
                GeneratorConfig::default()
            }
        }
    };

    let mut request = config.request(resolve_source(&args.open_api, &args.working_dir), &args.working_dir);
    if let Some(module) = &args.module {
        request.module = Some(module.clone());
    }
    Ok(request)
}

/// Relative file sources are resolved against the working directory
fn resolve_source(source: &str, working_dir: &Path) -> String {
    if is_remote(source) || Path::new(source).is_absolute() {
        source.to_string()
    } else {
        working_dir.join(source).to_string_lossy().into_owned()
    }
}

async fn run(request: GenerateServiceRequest) -> anyhow::Result<()> {
    let renderer = select_renderer(request.language)?;
    let orchestrator = GenerationOrchestrator::new(renderer, Arc::new(CompositePostProcessor::default()));
    let use_case = GenerateServiceUseCase::new(
        Arc::new(CompositeOpenApiLoader::new()?),
        Arc::new(orchestrator),
        Arc::new(FileSystemOutputService::new()),
        Arc::new(CommandRunner::new(Arc::new(ShellCommandExecutor::new()))),
    );

    let source = request.source.clone();
    let response = use_case
        .execute(request)
        .await
        .with_context(|| format!("Failed to generate from {source}"))?;

    if response.written {
        info!(
            artifacts = response.artifacts.len(),
            dir = %response.output_path.display(),
            title = %response.metadata.title,
            "✅ Generation complete"
        );
    } else {
        for path in &response.artifacts {
            println!("{}", path.display());
        }
        info!(artifacts = response.artifacts.len(), "✅ Description compiles");
    }

    for command in &response.failed_commands {
        warn!(command = %command, "post-generation command did not succeed");
    }

    Ok(())
}
