use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `POST /api/analyze-ticket`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    pub email_text: String,
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl TicketRequest {
    /// The attached image, treating an empty string like no image at all.
    pub fn image(&self) -> Option<&str> {
        self.image_base64
            .as_deref()
            .filter(|image| !image.trim().is_empty())
    }
}

/// Ticket as produced by the model. Missing, `null` or mistyped fields decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(deserialize_with = "lenient_text")]
    pub severity: String,
    #[serde(deserialize_with = "lenient_text")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_steps")]
    pub steps: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub fix: String,
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(text) => text,
        _ => String::new(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(text_of)
}

/// A list of steps, or one block of text with a step per line.
fn lenient_steps<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let steps = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(text_of)
            .filter(|step| !step.trim().is_empty())
            .collect(),
        Value::String(text) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    Ok(steps)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBadge {
    Alert,
    Default,
}

impl SeverityBadge {
    pub fn classify(severity: &str) -> Self {
        let lowered = severity.to_lowercase();
        if lowered.contains("critical") || lowered.contains("high") {
            SeverityBadge::Alert
        } else {
            SeverityBadge::Default
        }
    }
}

impl Ticket {
    pub fn badge(&self) -> SeverityBadge {
        SeverityBadge::classify(&self.severity)
    }

    /// Markdown written to the clipboard by the copy action.
    pub fn to_markdown(&self) -> String {
        let steps = self
            .steps
            .iter()
            .map(|step| format!("- {step}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "**Title:** {title}\n\
             **Severity:** {severity}\n\
             \n\
             **Summary:**\n\
             {summary}\n\
             \n\
             **Steps to Reproduce:**\n\
             {steps}\n\
             \n\
             **Suggested Fix:**\n\
             ```\n\
             {fix}\n\
             ```\n",
            title = self.title,
            severity = self.severity,
            summary = self.summary,
            fix = self.fix,
        )
    }
}
