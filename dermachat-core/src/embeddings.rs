//! Text embeddings via the Gemini `embedContent` endpoint.
//!
//! Documents are embedded with the `RETRIEVAL_DOCUMENT` task-type hint and
//! queries with `RETRIEVAL_QUERY`, so stored vectors and search vectors land
//! in the asymmetric-retrieval space the model was trained for.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

/// Dimensionality of `gemini-embedding-001` vectors as stored in Postgres.
pub const EMBEDDING_DIMENSIONS: usize = 3072;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Abstraction over embedding providers.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a document for storage.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embedding dimensionality.
    fn dimensions(&self) -> usize;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Task-type hint sent with each request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    #[default]
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("expected a {expected}-dim vector, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },

    #[error("Missing API key")]
    MissingApiKey,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },
}

/// Gemini embedding client configuration
#[derive(Debug, Clone)]
pub struct EmbeddingClientConfig {
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl EmbeddingClientConfig {
    pub fn new(api_key: Option<String>, model: String, dimensions: usize) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model,
            dimensions,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }

    pub fn from_config(config: &crate::config::EmbeddingConfig) -> Self {
        let mut c = Self::new(None, config.model.clone(), config.dimensions);
        c.max_retries = config.max_retries;
        c.retry_delay_ms = config.retry_delay_ms;
        c
    }
}

// Wire shapes for embedContent.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: ContentBlock<'a>,
    task_type: TaskType,
    output_dimensionality: usize,
}

#[derive(Debug, Serialize)]
struct ContentBlock<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbedVector,
}

#[derive(Debug, Deserialize)]
struct EmbedVector {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: u16,
    message: String,
}

/// Client for the Gemini Embeddings API.
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingClient {
    http: Client,
    config: EmbeddingClientConfig,
    base_url: String,
}

impl GeminiEmbeddingClient {
    pub fn new(config: EmbeddingClientConfig) -> Result<Self, EmbeddingError> {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: EmbeddingClientConfig,
        base_url: String,
    ) -> Result<Self, EmbeddingError> {
        if config.api_key.is_empty() {
            return Err(EmbeddingError::MissingApiKey);
        }

        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    async fn embed_with_task(
        &self,
        text: &str,
        task_type: TaskType,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        Retry::spawn(strategy, || self.request_embedding(text, task_type))
            .await
            .map_err(|e| {
                tracing::error!(
                    attempts = self.config.max_retries,
                    error = %e,
                    "All embedding retry attempts failed"
                );
                EmbeddingError::RetryExhausted {
                    attempts: self.config.max_retries,
                }
            })
    }

    async fn request_embedding(
        &self,
        text: &str,
        task_type: TaskType,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.config.model, self.config.api_key
        );

        let body = EmbedRequest {
            model: format!("models/{}", self.config.model),
            content: ContentBlock {
                parts: [TextPart { text }],
            },
            task_type,
            output_dimensionality: self.config.dimensions,
        };

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                .ok()
                .and_then(|e| e.error);
            let (code, message) = match detail {
                Some(d) => (d.code, d.message),
                None => (status.as_u16(), raw),
            };

            tracing::error!(code, message = %message, "Gemini embedding API error");
            return Err(EmbeddingError::Api { code, message });
        }

        let parsed: EmbedResponse = response.json().await?;
        let values = parsed.embedding.values;

        if values.len() != self.config.dimensions {
            return Err(EmbeddingError::InvalidDimensions {
                expected: self.config.dimensions,
                actual: values.len(),
            });
        }

        Ok(values)
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_with_task(text, TaskType::RetrievalDocument).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_with_task(text, TaskType::RetrievalQuery).await
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with_key(api_key: &str) -> EmbeddingClientConfig {
        EmbeddingClientConfig {
            api_key: api_key.to_string(),
            model: "gemini-embedding-001".to_string(),
            dimensions: EMBEDDING_DIMENSIONS,
            max_retries: 3,
            retry_delay_ms: 50,
        }
    }

    async fn mock_client(server: &MockServer) -> GeminiEmbeddingClient {
        GeminiEmbeddingClient::with_base_url(config_with_key("test-api-key"), server.uri())
            .expect("client should build with a key present")
    }

    fn stub_vector() -> serde_json::Value {
        let values: Vec<f32> = (0..EMBEDDING_DIMENSIONS)
            .map(|i| i as f32 / EMBEDDING_DIMENSIONS as f32)
            .collect();
        serde_json::json!({ "embedding": { "values": values } })
    }

    #[tokio::test]
    async fn test_query_embedding_uses_retrieval_query_task() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-embedding-001:embedContent"))
            .and(body_json(serde_json::json!({
                "model": "models/gemini-embedding-001",
                "content": { "parts": [{ "text": "serum for acne" }] },
                "taskType": "RETRIEVAL_QUERY",
                "outputDimensionality": EMBEDDING_DIMENSIONS
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_vector()))
            .mount(&server)
            .await;

        let vector = client.embed_query("serum for acne").await.unwrap();
        assert_eq!(vector.len(), EMBEDDING_DIMENSIONS);
    }

    #[tokio::test]
    async fn test_document_embedding_uses_retrieval_document_task() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "model": "models/gemini-embedding-001",
                "content": { "parts": [{ "text": "niacinamide basics" }] },
                "taskType": "RETRIEVAL_DOCUMENT",
                "outputDimensionality": EMBEDDING_DIMENSIONS
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_vector()))
            .mount(&server)
            .await;

        assert!(client.embed("niacinamide basics").await.is_ok());
    }

    #[tokio::test]
    async fn test_persistent_500_exhausts_retries() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": 500, "message": "Internal server error" }
            })))
            .mount(&server)
            .await;

        match client.embed_query("hello world").await {
            Err(EmbeddingError::RetryExhausted { attempts }) => assert_eq!(attempts, 3),
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_single_429_is_retried_to_success() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "Rate limit exceeded" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(stub_vector()))
            .mount(&server)
            .await;

        assert!(client.embed_query("hello world").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_api_key_rejected_at_construction() {
        match GeminiEmbeddingClient::new(config_with_key("")) {
            Err(EmbeddingError::MissingApiKey) => {}
            other => panic!("expected MissingApiKey, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_truncated_vector_is_rejected() {
        let server = MockServer::start().await;
        let client = mock_client(&server).await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": { "values": [0.1, 0.2, 0.3] }
            })))
            .mount(&server)
            .await;

        assert!(client.embed_query("hello world").await.is_err());
    }
}
