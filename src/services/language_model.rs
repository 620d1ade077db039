use async_trait::async_trait;

use crate::domain::prompt::TicketPrompt;
use crate::error::AppResult;

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Returns the raw completion text, requested as JSON.
    async fn generate_json(&self, prompt: &TicketPrompt) -> AppResult<String>;

    /// Model identifiers the configured credential may call.
    async fn list_models(&self) -> AppResult<Vec<String>>;
}
