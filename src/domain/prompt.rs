use std::sync::LazyLock;

use regex::Regex;

use crate::domain::ticket::TicketRequest;

const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

static DATA_URL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(image/[\w.+-]+);base64,").expect("data URL pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Accepts either a bare base64 payload or a `data:image/...;base64,` URL.
    pub fn from_data_url(raw: &str) -> Self {
        let raw = raw.trim();
        match DATA_URL_PREFIX.captures(raw) {
            Some(captures) => {
                let prefix_len = captures.get(0).map_or(0, |m| m.end());
                let mime_type = captures
                    .get(1)
                    .map_or(FALLBACK_IMAGE_MIME, |m| m.as_str())
                    .to_string();
                Self {
                    mime_type,
                    data: raw[prefix_len..].to_string(),
                }
            }
            None => Self {
                mime_type: FALLBACK_IMAGE_MIME.to_string(),
                data: raw.to_string(),
            },
        }
    }
}

/// Everything sent to the language model for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPrompt {
    pub text: String,
    pub image: Option<InlineImage>,
}

impl TicketPrompt {
    pub fn from_request(request: &TicketRequest) -> Self {
        Self {
            text: instruction(&request.email_text),
            image: request.image().map(InlineImage::from_data_url),
        }
    }
}

fn instruction(report: &str) -> String {
    format!(
        "Act as a Senior QA Engineer.\n\
         Analyze this bug report: \"{report}\"\n\
         Output valid JSON with keys: title, severity, summary, steps, fix."
    )
}
