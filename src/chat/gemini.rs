//! Gemini `generateContent` REST client.

use super::backend::{GenerativeBackend, Role, Turn};
use crate::error::{is_capacity_signal, LabError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Configuration for the chat client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub api_key: String,
    pub model: String,
    /// API root, without trailing slash
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// reqwest-backed `GenerativeBackend`.
pub struct GeminiClient {
    config: ChatConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LabError::config_error("generative API key is empty"));
        }

        let http = reqwest::Client::builder()
            .user_agent(format!("labkit/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| LabError::config_error(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.config.base_url, self.config.model)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, turns: &[Turn]) -> Result<String> {
        let request = GenerateRequest {
            contents: turns
                .iter()
                .map(|turn| Content {
                    role: match turn.role {
                        Role::User => "user",
                        Role::Model => "model",
                    },
                    parts: [Part { text: &turn.text }],
                })
                .collect(),
        };

        debug!(model = %self.config.model, turns = turns.len(), "sending generateContent request");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: GenerateResponse = response
                .json()
                .await
                .map_err(|e| LabError::remote(format!("undecodable response: {}", e)))?;
            return body
                .into_text()
                .ok_or_else(|| LabError::remote("response contained no candidate text"));
        }

        let body = response.text().await.unwrap_or_default();
        let (message, status_field) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.message, envelope.error.status),
            Err(_) => (body, None),
        };
        Err(classify_failure(status.as_u16(), status_field.as_deref(), &message))
    }
}

fn classify_failure(status: u16, status_field: Option<&str>, message: &str) -> LabError {
    if is_capacity_signal(Some(status), status_field, message) {
        warn!(status, "generative API capacity limit");
        return LabError::transient(format!("status {}: {}", status, message));
    }
    match status {
        401 | 403 => LabError::unauthorized(format!("status {}: {}", status, message)),
        _ => LabError::remote(format!("status {}: {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure() {
        assert!(classify_failure(429, None, "Too Many Requests").is_transient());
        assert!(classify_failure(400, Some("RESOURCE_EXHAUSTED"), "").is_transient());
        assert!(classify_failure(500, None, "Quota exceeded for metric").is_transient());
        assert!(matches!(
            classify_failure(403, Some("PERMISSION_DENIED"), "API key not valid"),
            LabError::Unauthorized(_)
        ));
        assert!(matches!(classify_failure(500, Some("INTERNAL"), "boom"), LabError::Remote(_)));
    }

    #[test]
    fn test_response_text_joined() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Wubba "},{"text":"lubba"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.into_text().as_deref(), Some("Wubba lubba"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.into_text().is_none());
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(GeminiClient::new(ChatConfig::default()).is_err());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(
            ChatConfig::new("key")
                .with_model("gemini-2.5-flash")
                .with_base_url("http://localhost:1234/v1beta/"),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
