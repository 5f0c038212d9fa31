//! Application layer - orchestrates use cases and coordinates between domains

pub mod commands;
pub mod config;
pub mod errors;
pub mod generate_service;
pub mod traits;

pub use commands::*;
pub use config::GeneratorConfig;
pub use errors::*;
pub use generate_service::GenerateServiceUseCase;
pub use traits::*;
