use super::agent::AgentKind;
use super::retrieval::SourceRef;
use serde::Serialize;

/// Classification summary echoed back in response metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysisMeta {
    pub agent_type: AgentKind,
    pub confidence: f64,
    pub reasoning: String,
}

/// Retrieval summary echoed back in response metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalMeta {
    pub success: bool,
    pub sources_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetadata {
    pub session_id: String,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_analysis: Option<QueryAnalysisMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<RetrievalMeta>,
}

/// Final result of one orchestrated chat turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOutcome {
    pub success: bool,
    pub response: String,
    pub metadata: ChatMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    /// Internal error detail for logs; omitted from client payloads.
    #[serde(skip_serializing)]
    pub error: Option<String>,
}
