use config::{Config, File};
use serde::Deserialize;

use crate::error::DermachatError;

#[derive(Debug, Deserialize, Clone)]
pub struct DermachatConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub websearch: WebSearchConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub max_output_tokens: u32,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            max_output_tokens: 2048,
            max_retries: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimensions: usize,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "gemini-embedding-001".to_string(),
            dimensions: crate::embeddings::EMBEDDING_DIMENSIONS,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSearchConfig {
    pub result_limit: usize,
    pub max_characters: usize,
    pub highlight_sentences: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            result_limit: 5,
            max_characters: 1000,
            highlight_sentences: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a row to count as relevant.
    pub similarity_threshold: f64,
    pub product_limit: u32,
    pub article_limit: u32,
    /// Exchanges kept per session (oldest evicted first).
    pub history_limit: usize,
    /// Exchanges shown to the synthesizer.
    pub synthesis_history_window: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            product_limit: 10,
            article_limit: 8,
            history_limit: 10,
            synthesis_history_window: 5,
        }
    }
}

impl DermachatConfig {
    pub fn load(path: &str) -> Result<Self, DermachatError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        Ok(s.try_deserialize()?)
    }
}
