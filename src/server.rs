use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::context::AppContext;
use crate::domain::ticket::TicketRequest;
use crate::error::{AppError, AppResult};
use crate::workflow::analyze::analyze_ticket;
use crate::workflow::diagnostics::list_available_models;

pub const ANALYZE_PATH: &str = "/api/analyze-ticket";
pub const CHECK_MODELS_PATH: &str = "/api/check-models";

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route(ANALYZE_PATH, post(analyze))
        .route(CHECK_MODELS_PATH, get(check_models))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(ctx)
}

pub async fn run_server(listener: TcpListener, ctx: AppContext) -> AppResult<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "ticket server listening");
    }
    if !ctx.has_api_key() {
        tracing::warn!("Gemini API key not configured; analysis requests will fail");
    }
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Serialize)]
struct ModelsBody {
    success: bool,
    available_models: Vec<String>,
}

fn error_response(status: StatusCode, message: String, details: Option<String>) -> Response {
    let body = Json(ErrorBody {
        error: message,
        details,
    });
    (status, body).into_response()
}

fn envelope_message(err: &AppError) -> String {
    match err {
        AppError::Configuration(message) => message.clone(),
        other => other.to_string(),
    }
}

// The body is decoded by hand so clients posting `text/plain` JSON still work.
async fn analyze(State(ctx): State<AppContext>, body: Bytes) -> Response {
    let request = match serde_json::from_slice::<TicketRequest>(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::error!(error = %err, "unreadable analysis request");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("invalid request body: {err}"),
                None,
            );
        }
    };

    match analyze_ticket(&ctx, &request).await {
        Ok(ticket) => (StatusCode::OK, Json(ticket)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "ticket analysis failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, envelope_message(&err), None)
        }
    }
}

async fn check_models(State(ctx): State<AppContext>) -> Response {
    match list_available_models(&ctx).await {
        Ok(models) => (
            StatusCode::OK,
            Json(ModelsBody {
                success: true,
                available_models: models,
            }),
        )
            .into_response(),
        Err(AppError::Upstream { status, body }) => {
            tracing::warn!(status, "provider rejected model listing");
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            error_response(status, "Provider rejected key".to_string(), Some(body))
        }
        Err(err) => {
            tracing::error!(error = %err, "model listing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, envelope_message(&err), None)
        }
    }
}
