pub mod agent;
pub mod chat;
pub mod retrieval;

pub use agent::{AgentKind, Classification};
pub use chat::{ChatMetadata, ChatOutcome, QueryAnalysisMeta, RetrievalMeta};
pub use retrieval::{RetrievalOutcome, RetrievedItem, SourceRef};
