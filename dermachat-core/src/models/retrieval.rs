use serde::Serialize;

/// One retrieved context item, 1-based rank. Lives only for the duration of a
/// single request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum RetrievedItem {
    #[serde(rename_all = "camelCase")]
    Product {
        rank: usize,
        content: String,
        product_name: Option<String>,
        brand: Option<String>,
        category: Option<String>,
        similarity: f64,
    },
    #[serde(rename_all = "camelCase")]
    Article {
        rank: usize,
        content: String,
        title: Option<String>,
        author: Option<String>,
        tags: Vec<String>,
        source_link: Option<String>,
        similarity: f64,
    },
    #[serde(rename_all = "camelCase")]
    Web {
        rank: usize,
        title: Option<String>,
        url: String,
        text: Option<String>,
        highlights: Vec<String>,
    },
}

impl RetrievedItem {
    /// Title used for source attribution.
    pub fn title(&self) -> Option<&str> {
        match self {
            RetrievedItem::Product { product_name, .. } => product_name.as_deref(),
            RetrievedItem::Article { title, .. } => title.as_deref(),
            RetrievedItem::Web { title, .. } => title.as_deref(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            RetrievedItem::Web { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// What a specialist hands back to the orchestrator: a grounded answer plus
/// the context it was grounded on. `success: false` is a structured, non-fatal
/// outcome (empty retrieval or a provider failure), never an exception.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub success: bool,
    pub answer: String,
    pub items: Vec<RetrievedItem>,
    pub retrieved_count: usize,
    /// Provider error detail, kept for logs only — never shown to the user.
    pub error: Option<String>,
}

impl RetrievalOutcome {
    pub fn failure(answer: impl Into<String>) -> Self {
        Self {
            success: false,
            answer: answer.into(),
            items: Vec::new(),
            retrieved_count: 0,
            error: None,
        }
    }

    pub fn failure_with_error(answer: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::failure(answer)
        }
    }
}

/// Source attribution entry (top 3 retrieved items).
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}
