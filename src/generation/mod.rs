//! Generation domain module - compiles an API description into a service model
//!
//! The semantic stages (resolver, enum and DTO emitters, endpoint classifier,
//! parameter planner, handler and route emitters) are pure functions over an
//! [`ApiDocument`]. Rendering to a target language happens behind
//! [`ServiceRenderer`].

pub mod catalog;
pub mod context;
pub mod document;
pub mod dto;
pub mod endpoints;
pub mod enums;
pub mod errors;
pub mod extensions;
pub mod handlers;
pub mod model;
pub mod orchestrator;
pub mod params;
pub mod resolver;
pub mod routes;
pub mod traits;
pub mod types;
pub mod utils;

pub use context::*;
pub use document::*;
pub use errors::*;
pub use model::*;
pub use orchestrator::*;
pub use traits::*;
pub use types::*;
