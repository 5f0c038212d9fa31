//! Generation infrastructure implementations

pub mod context_builders;
pub mod go_renderer;
pub mod post_processor;
pub mod renderer_factory;

pub use go_renderer::GoServiceRenderer;
pub use post_processor::{CommandRunner, CompositePostProcessor, FormattingPostProcessor};
pub use renderer_factory::select_renderer;
