use async_trait::async_trait;
use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::domain::prompt::TicketPrompt;
use crate::error::{AppError, AppResult};
use crate::services::LanguageModelService;

const API_KEY_HEADER: &str = "x-goog-api-key";
const JSON_MIME: &str = "application/json";

pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("Gemini API key not configured".to_string()))
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model.trim_start_matches("models/")
        )
    }

    fn models_endpoint(&self) -> String {
        format!("{}/v1beta/models", self.base_url.trim_end_matches('/'))
    }

    async fn read_failure(response: Response) -> (u16, String) {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        (status, body)
    }
}

#[async_trait]
impl LanguageModelService for GeminiClient {
    async fn generate_json(&self, prompt: &TicketPrompt) -> AppResult<String> {
        let api_key = self.api_key()?;
        let request_body = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .http
            .post(self.generate_endpoint())
            .header(API_KEY_HEADER, api_key)
            .header(CONTENT_TYPE, JSON_MIME)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::LanguageModel(format!("failed to call Gemini: {err}")))?;

        if !response.status().is_success() {
            let (status, body) = Self::read_failure(response).await;
            return Err(AppError::Upstream {
                status,
                body: provider_message(&body).unwrap_or(body),
            });
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|err| {
            AppError::InvalidResponse(format!("failed to parse Gemini response: {err}"))
        })?;

        payload.into_text()
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        let api_key = self.api_key()?;

        let response = self
            .http
            .get(self.models_endpoint())
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|err| AppError::LanguageModel(format!("failed to call Gemini: {err}")))?;

        if !response.status().is_success() {
            let (status, body) = Self::read_failure(response).await;
            return Err(AppError::Upstream { status, body });
        }

        let payload: ListModelsResponse = response.json().await.map_err(|err| {
            AppError::InvalidResponse(format!("failed to parse model list: {err}"))
        })?;

        Ok(payload.models.into_iter().map(|model| model.name).collect())
    }
}

/// Pulls `error.message` out of a Gemini error envelope.
fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: &TicketPrompt) -> Self {
        let mut parts = vec![GeminiPart::Text {
            text: prompt.text.clone(),
        }];
        if let Some(image) = &prompt.image {
            parts.push(GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME,
            },
        }
    }
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    fn into_text(self) -> AppResult<String> {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty());

        match (text, self.prompt_feedback.and_then(|f| f.block_reason)) {
            (Some(text), _) => Ok(text),
            (None, Some(reason)) => Err(AppError::LanguageModel(format!(
                "prompt was blocked: {reason}"
            ))),
            (None, None) => Err(AppError::LanguageModel(
                "Gemini returned no candidates".to_string(),
            )),
        }
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::prompt::InlineImage;

    fn client(server: &MockServer, key: Option<&str>) -> GeminiClient {
        GeminiClient::new(
            key.map(str::to_string),
            "gemini-2.5-flash".to_string(),
            server.uri(),
        )
    }

    fn text_prompt() -> TicketPrompt {
        TicketPrompt {
            text: "Analyze this bug report".to_string(),
            image: None,
        }
    }

    #[test]
    fn request_body_carries_inline_image_and_json_mime() {
        let prompt = TicketPrompt {
            text: "describe".to_string(),
            image: Some(InlineImage {
                mime_type: "image/png".to_string(),
                data: "AAAA".to_string(),
            }),
        };
        let body = serde_json::to_value(GenerateContentRequest::from_prompt(&prompt)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "describe" },
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ]
                }],
                "generationConfig": { "responseMimeType": "application/json" }
            })
        );
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"title\":" }, { "text": "\"Bug\"}" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server, Some("test-key"))
            .generate_json(&text_prompt())
            .await
            .unwrap();
        assert_eq!(text, r#"{"title":"Bug"}"#);
    }

    #[tokio::test]
    async fn surfaces_provider_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
            })))
            .mount(&server)
            .await;

        let err = client(&server, Some("bad-key"))
            .generate_json(&text_prompt())
            .await
            .unwrap_err();
        match err {
            AppError::Upstream { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "API key not valid.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [],
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let err = client(&server, Some("test-key"))
            .generate_json(&text_prompt())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn missing_key_skips_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server, None)
            .generate_json(&text_prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn lists_model_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    { "name": "models/gemini-2.5-flash", "displayName": "Gemini 2.5 Flash" },
                    { "name": "models/gemini-2.5-pro" }
                ]
            })))
            .mount(&server)
            .await;

        let models = client(&server, Some("test-key")).list_models().await.unwrap();
        assert_eq!(models, vec!["models/gemini-2.5-flash", "models/gemini-2.5-pro"]);
    }

    #[tokio::test]
    async fn model_listing_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = client(&server, Some("test-key")).list_models().await.unwrap_err();
        match err {
            AppError::Upstream { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "permission denied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
