use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::LanguageModelService;

/// Shared, read-only state handed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub language_model: Arc<dyn LanguageModelService>,
}

impl AppContext {
    pub fn new(config: AppConfig, language_model: Arc<dyn LanguageModelService>) -> Self {
        Self {
            config: Arc::new(config),
            language_model,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.config
            .gemini_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}
