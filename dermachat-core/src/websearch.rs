//! Web search provider — Exa search with text excerpts and highlights, used
//! for queries outside the skincare/haircare domain.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One web search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebHit {
    pub title: Option<String>,
    pub url: String,
    pub text: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub published_date: Option<String>,
}

#[derive(Error, Debug)]
pub enum WebSearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication or configuration failure at the search provider.
    /// Surfaced to the user differently from transient failures.
    #[error("Search provider auth error: {0}")]
    Auth(String),

    #[error("Search provider error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key")]
    MissingApiKey,
}

impl WebSearchError {
    /// Whether this failure stems from API-key / authorization problems.
    pub fn is_auth(&self) -> bool {
        match self {
            WebSearchError::Auth(_) | WebSearchError::MissingApiKey => true,
            WebSearchError::Api { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("api key") || lower.contains("unauthorized")
            }
            _ => false,
        }
    }
}

/// Abstraction over web search providers.
#[async_trait]
pub trait WebSearchBackend: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>, WebSearchError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Exa client configuration
#[derive(Debug, Clone)]
pub struct ExaClientConfig {
    pub api_key: String,
    pub max_characters: usize,
    pub highlight_sentences: usize,
}

impl ExaClientConfig {
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("EXA_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            max_characters: 1000,
            highlight_sentences: 3,
        }
    }

    pub fn from_config(config: &crate::config::WebSearchConfig) -> Self {
        let mut c = Self::new(None);
        c.max_characters = config.max_characters;
        c.highlight_sentences = config.highlight_sentences;
        c
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaRequest {
    query: String,
    #[serde(rename = "type")]
    search_type: String,
    num_results: usize,
    contents: ExaContents,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: ExaText,
    highlights: ExaHighlights,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaText {
    max_characters: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaHighlights {
    num_sentences: usize,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<WebHit>,
}

/// Exa web search client — POST /search with contents and highlights.
#[derive(Debug, Clone)]
pub struct ExaSearchClient {
    client: Client,
    config: ExaClientConfig,
    base_url: String,
}

impl ExaSearchClient {
    pub fn new(config: ExaClientConfig) -> Result<Self, WebSearchError> {
        Self::build(config, "https://api.exa.ai".to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(config: ExaClientConfig, base_url: String) -> Result<Self, WebSearchError> {
        Self::build(config, base_url)
    }

    fn build(config: ExaClientConfig, base_url: String) -> Result<Self, WebSearchError> {
        if config.api_key.is_empty() {
            return Err(WebSearchError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }
}

#[async_trait]
impl WebSearchBackend for ExaSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<WebHit>, WebSearchError> {
        let request = ExaRequest {
            query: query.to_string(),
            search_type: "auto".to_string(),
            num_results: limit,
            contents: ExaContents {
                text: ExaText {
                    max_characters: self.config.max_characters,
                },
                highlights: ExaHighlights {
                    num_sentences: self.config.highlight_sentences,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(code = status.as_u16(), message = %message, "Exa API error");

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(WebSearchError::Auth(message));
            }
            return Err(WebSearchError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: ExaResponse = response.json().await?;
        Ok(body.results)
    }

    fn name(&self) -> &str {
        "exa"
    }
}

/// Stand-in used when no search API key is configured. Every call reports an
/// auth failure, which the pipeline turns into the "web search unavailable"
/// message instead of crashing the server at startup.
pub struct DisabledWebSearch;

#[async_trait]
impl WebSearchBackend for DisabledWebSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<WebHit>, WebSearchError> {
        Err(WebSearchError::Auth("EXA_API_KEY is not configured".to_string()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

// ============================================================================
// TESTS
// ============================================================================
