pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod search;
pub mod session;
pub mod websearch;

pub use config::DermachatConfig;
pub use embeddings::{
    EmbeddingBackend, EmbeddingClientConfig, EmbeddingError, GeminiEmbeddingClient,
    EMBEDDING_DIMENSIONS,
};
pub use error::DermachatError;
pub use llm::{ChatBackend, ChatOptions, GeminiChatClient, LlmError};
pub use models::AgentKind;
pub use search::{PgVectorStore, VectorStore};
pub use session::SessionStore;
pub use websearch::{ExaSearchClient, WebHit, WebSearchBackend, WebSearchError};
