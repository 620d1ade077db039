use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::ticket::{Ticket, TicketRequest};
use crate::error::{AppError, AppResult};
use crate::server::{ANALYZE_PATH, CHECK_MODELS_PATH};
use crate::services::TicketService;

/// Talks to a running `ticketzero serve` instance.
pub struct HttpTicketApi {
    http: Client,
    server_url: String,
}

impl HttpTicketApi {
    pub fn new(server_url: String) -> Self {
        Self {
            http: Client::new(),
            server_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl TicketService for HttpTicketApi {
    async fn analyze(&self, request: &TicketRequest) -> AppResult<Ticket> {
        let response = self
            .http
            .post(self.endpoint(ANALYZE_PATH))
            .json(request)
            .send()
            .await
            .map_err(|err| AppError::Client(format!("failed to reach ticket server: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "analysis endpoint returned a failure");
            return Err(AppError::Client("API Failed".to_string()));
        }

        response
            .json::<Ticket>()
            .await
            .map_err(|err| AppError::Client(format!("unexpected ticket payload: {err}")))
    }

    async fn check_models(&self) -> AppResult<Vec<String>> {
        let response = self
            .http
            .get(self.endpoint(CHECK_MODELS_PATH))
            .send()
            .await
            .map_err(|err| AppError::Client(format!("failed to reach ticket server: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let failure = response.json::<FailureBody>().await.ok();
            let message = match failure {
                Some(FailureBody {
                    error,
                    details: Some(details),
                }) => format!("{status}: {error} ({details})"),
                Some(FailureBody { error, .. }) => format!("{status}: {error}"),
                None => status.to_string(),
            };
            return Err(AppError::Client(message));
        }

        let body: ModelsBody = response
            .json()
            .await
            .map_err(|err| AppError::Client(format!("unexpected model payload: {err}")))?;
        Ok(body.available_models)
    }
}

#[derive(Deserialize)]
struct ModelsBody {
    #[serde(default)]
    available_models: Vec<String>,
}

#[derive(Deserialize)]
struct FailureBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}
