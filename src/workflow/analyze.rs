use serde_json::Value;

use crate::context::AppContext;
use crate::domain::prompt::TicketPrompt;
use crate::domain::ticket::TicketRequest;
use crate::error::{AppError, AppResult};

pub const MISSING_KEY_MESSAGE: &str = "API Key Missing";

/// Sends one bug report to the model and returns its JSON reply as-is.
pub async fn analyze_ticket(ctx: &AppContext, request: &TicketRequest) -> AppResult<Value> {
    if !ctx.has_api_key() {
        return Err(AppError::Configuration(MISSING_KEY_MESSAGE.to_string()));
    }

    let prompt = TicketPrompt::from_request(request);
    tracing::info!(
        model = %ctx.config.gemini_model,
        with_image = prompt.image.is_some(),
        "sending ticket analysis request"
    );

    let reply = ctx.language_model.generate_json(&prompt).await?;
    let ticket = serde_json::from_str::<Value>(reply.trim())
        .map_err(|err| AppError::InvalidResponse(format!("model reply is not JSON: {err}")))?;

    tracing::info!("ticket analysis succeeded");
    Ok(ticket)
}
