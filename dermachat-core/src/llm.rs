//! LLM completion client — Gemini `generateContent` behind a `ChatBackend`
//! trait so the agent pipeline can run against a fake in tests.
//!
//! Every agent call is one system prompt plus one user prompt; per-agent
//! sampling temperature rides in `ChatOptions`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

/// Per-call generation options.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

impl ChatOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

/// Abstraction over LLM completion providers.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one completion: system instruction + user message -> answer text.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> Result<String, LlmError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Empty completion: no candidate text in response")]
    EmptyCompletion,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },
}

/// Gemini chat client configuration
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub api_key: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
}

impl ChatClientConfig {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model,
            max_output_tokens: 2048,
            max_retries: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 30,
        }
    }

    pub fn from_config(config: &crate::config::LlmConfig) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
            timeout_seconds: config.timeout_seconds,
            ..Self::new(None, config.model.clone())
        }
    }
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: RequestContent,
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
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
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// GeminiChatClient
// ============================================================================

/// Gemini chat client — calls `models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiChatClient {
    client: Client,
    config: ChatClientConfig,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(config: ChatClientConfig) -> Result<Self, LlmError> {
        Self::build(config, "https://generativelanguage.googleapis.com/v1beta".to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(config: ChatClientConfig, base_url: String) -> Result<Self, LlmError> {
        Self::build(config, base_url)
    }

    fn build(config: ChatClientConfig, base_url: String) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    async fn complete_once(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.config.model, self.config.api_key
        );

        let request = GenerateRequest {
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart {
                    text: system.to_string(),
                }],
            },
            contents: vec![RequestContent {
                role: Some("user".to_string()),
                parts: vec![RequestPart {
                    text: user.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens.min(self.config.max_output_tokens),
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini chat API error");

            return Err(LlmError::Api { code, message });
        }

        let body: GenerateResponse = response.json().await?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }

        Ok(text)
    }
}

#[async_trait]
impl ChatBackend for GeminiChatClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> Result<String, LlmError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let result =
            Retry::spawn(retry_strategy, || self.complete_once(system, user, options)).await;

        match result {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!(
                    attempts = self.config.max_retries,
                    error = %e,
                    "All completion retry attempts failed"
                );
                Err(LlmError::RetryExhausted {
                    attempts: self.config.max_retries,
                })
            }
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_key: &str) -> ChatClientConfig {
        ChatClientConfig {
            api_key: api_key.to_string(),
            model: "gemini-2.0-flash".to_string(),
            max_output_tokens: 2048,
            max_retries: 2,
            retry_delay_ms: 50,
            timeout_seconds: 30,
        }
    }

    fn completion_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": text }], "role": "model" } }
            ]
        })
    }

    #[tokio::test]
    async fn test_complete_returns_candidate_text() {
        let mock_server = MockServer::start().await;
        let client = GeminiChatClient::with_base_url(test_config("key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("Use a gentle cleanser.")),
            )
            .mount(&mock_server)
            .await;

        let result = client
            .complete("You are helpful.", "What should I use?", ChatOptions::default())
            .await;

        assert_eq!(result.unwrap(), "Use a gentle cleanser.");
    }

    #[tokio::test]
    async fn test_complete_joins_multiple_parts() {
        let mock_server = MockServer::start().await;
        let client = GeminiChatClient::with_base_url(test_config("key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    { "content": { "parts": [{ "text": "Hello " }, { "text": "there" }] } }
                ]
            })))
            .mount(&mock_server)
            .await;

        let result = client
            .complete("sys", "user", ChatOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "Hello there");
    }

    #[tokio::test]
    async fn test_complete_errors_on_empty_candidates() {
        let mock_server = MockServer::start().await;
        let client = GeminiChatClient::with_base_url(test_config("key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", "user", ChatOptions::default()).await;
        assert!(result.is_err(), "Empty candidates should be an error");
    }

    #[tokio::test]
    async fn test_complete_retries_then_exhausts_on_500() {
        let mock_server = MockServer::start().await;
        let client = GeminiChatClient::with_base_url(test_config("key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": 500, "message": "boom" }
            })))
            .mount(&mock_server)
            .await;

        let result = client.complete("sys", "user", ChatOptions::default()).await;
        match result {
            Err(LlmError::RetryExhausted { attempts }) => assert_eq!(attempts, 2),
            other => panic!("Expected RetryExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_fails_with_missing_api_key() {
        let result = GeminiChatClient::new(test_config(""));
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }
}
