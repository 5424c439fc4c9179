//! Concrete text-generation backends

use super::AiBackend;
use nutriscan_types::AiError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini `generateContent` over blocking HTTP.
///
/// The client-level timeout bounds every call; an expired call is reported as
/// [`AiError::Timeout`] and the caller falls back. The key travels in a
/// header and transport errors are stripped of their URL.
#[derive(Debug)]
pub struct GeminiBackend {
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self, AiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AiError::RequestFailed(e.without_url().to_string()))?;

        Ok(Self {
            api_key,
            model,
            base_url: GEMINI_ENDPOINT.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

impl AiBackend for GeminiBackend {
    fn send_prompt(&self, prompt: &str) -> Result<String, AiError> {
        let request = GenerateRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending prompt");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| self.transport_error(e))?;

        if status != 200 {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            return Err(AiError::ApiError { status, message });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| AiError::MalformedOutput(e.to_string()))?;

        // Concatenate the text parts of the first candidate
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::MalformedOutput("No text content in response".to_string()));
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

impl GeminiBackend {
    fn transport_error(&self, e: reqwest::Error) -> AiError {
        if e.is_timeout() {
            AiError::Timeout(self.timeout_secs)
        } else {
            AiError::RequestFailed(e.without_url().to_string())
        }
    }
}

/// Backend used when no generator is configured: every call is unavailable,
/// so health assessment always takes its deterministic path.
#[derive(Debug, Clone, Default)]
pub struct OfflineBackend {
    reason: String,
}

impl OfflineBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AiBackend for OfflineBackend {
    fn send_prompt(&self, _prompt: &str) -> Result<String, AiError> {
        let reason = if self.reason.is_empty() {
            "no text-generation backend configured"
        } else {
            self.reason.as_str()
        };
        Err(AiError::Unavailable(reason.to_string()))
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_backend_is_unavailable() {
        let backend = OfflineBackend::default();
        match backend.send_prompt("anything") {
            Err(AiError::Unavailable(msg)) => assert!(msg.contains("no text-generation backend")),
            other => panic!("unexpected: {:?}", other),
        }

        let backend = OfflineBackend::new("GEMINI_API_KEY is not set");
        assert_eq!(
            backend.send_prompt("x").unwrap_err().to_string(),
            AiError::Unavailable("GEMINI_API_KEY is not set".to_string()).to_string()
        );
    }

    #[test]
    fn test_gemini_endpoint() {
        let backend = GeminiBackend::new("k".to_string(), "gemini-2.0-flash".to_string(), 5).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(backend.name(), "gemini");
    }

    #[test]
    fn test_response_text_parts_joined() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}],"role":"model"}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "{\"a\":1}");
    }

    #[test]
    fn test_transport_error_omits_key() {
        let backend = GeminiBackend::new("SECRET_KEY_123".to_string(), "gemini-2.0-flash".to_string(), 3)
            .unwrap()
            .with_base_url("http://127.0.0.1:1/v1beta/models");
        let err = backend.send_prompt("hello").unwrap_err();
        assert!(matches!(err, AiError::RequestFailed(_) | AiError::Timeout(_)));
        assert!(!err.to_string().contains("SECRET_KEY_123"));
        assert!(!format!("{:?}", err).contains("SECRET_KEY_123"));
    }

    #[test]
    #[ignore] // Requires network access and GEMINI_API_KEY
    fn test_gemini_live_call() {
        let key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY not set");
        let backend = GeminiBackend::new(key, "gemini-2.0-flash".to_string(), 30).unwrap();
        let reply = backend.send_prompt("Reply with the single word: ok").unwrap();
        assert!(!reply.trim().is_empty());
    }
}
