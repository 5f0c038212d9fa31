//! Factory for selecting the renderer of a target language

use std::sync::Arc;

use crate::generation::{GenerationError, Language, ServiceRenderer};

use super::GoServiceRenderer;

/// Select the renderer for a target language
pub fn select_renderer(language: Language) -> Result<Arc<dyn ServiceRenderer>, GenerationError> {
    match language {
        Language::Go => Ok(Arc::new(GoServiceRenderer::new()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_go_renderer() {
        let renderer = select_renderer(Language::Go).unwrap();
        assert_eq!(renderer.language(), Language::Go);
    }
}
