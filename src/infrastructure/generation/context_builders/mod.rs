//! Language-specific context builders

pub mod go;

pub use go::GoContextBuilder;
