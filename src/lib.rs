//! servicegen compiles an OpenAPI description into Go service scaffolding:
//! DTO groups, enum packages, per-package HTTP handlers, a route table and
//! an application error catalogue.
//!
//! The crate is layered the same way the CLI drives it:
//!
//! - [`generation`] holds the pure compiler, from [`generation::ApiDocument`]
//!   to [`generation::ServiceModel`], plus the ports for loading and rendering
//! - [`infrastructure`] implements those ports (OpenAPI loaders, the Tera
//!   based Go renderer, the staged filesystem writer, shell commands)
//! - [`application`] wires them into the generate use case
#![deny(unsafe_code)]

pub mod application;
pub mod generation;
pub mod infrastructure;
