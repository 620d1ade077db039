use crate::context::AppContext;
use crate::error::{AppError, AppResult};

pub const NO_KEY_MESSAGE: &str = "No API Key found in configuration";

/// Lists the models the configured credential can reach.
pub async fn list_available_models(ctx: &AppContext) -> AppResult<Vec<String>> {
    if !ctx.has_api_key() {
        return Err(AppError::Configuration(NO_KEY_MESSAGE.to_string()));
    }

    tracing::info!("checking available models");
    let models = ctx.language_model.list_models().await?;
    tracing::info!(count = models.len(), "model listing succeeded");
    Ok(models)
}
