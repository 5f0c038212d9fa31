//! OpenAPI loading implementations

pub mod composite_loader;
pub mod file_loader;
pub mod format;
pub mod http_loader;
pub mod parser;

pub use composite_loader::{CompositeOpenApiLoader, is_remote};
pub use file_loader::FileOpenApiLoader;
pub use http_loader::HttpOpenApiLoader;
pub use parser::OpenApiParser;
