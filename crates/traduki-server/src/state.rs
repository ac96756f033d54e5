use std::sync::Arc;

use traduki::TranslationService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TranslationService>,
}

impl AppState {
    pub fn new(service: Arc<TranslationService>) -> Self {
        Self { service }
    }
}
