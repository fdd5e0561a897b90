use serde::{Deserialize, Serialize};

/// The three specialist agents a query can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    ProductRecommender,
    BlogSolutionFinder,
    WebSearch,
}

impl AgentKind {
    /// Wire label used in API responses and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::ProductRecommender => "product_recommender",
            AgentKind::BlogSolutionFinder => "blog_solution_finder",
            AgentKind::WebSearch => "web_search",
        }
    }

    /// Source attribution type for this agent's retrieved items.
    pub fn source_kind(&self) -> &'static str {
        match self {
            AgentKind::ProductRecommender => "product",
            AgentKind::BlogSolutionFinder => "blog",
            AgentKind::WebSearch => "web",
        }
    }

    /// Human-readable specialist name, used in synthesis prompts.
    pub fn specialist_name(&self) -> &'static str {
        match self {
            AgentKind::ProductRecommender => "Product Recommendation Specialist",
            AgentKind::BlogSolutionFinder => "Skincare & Haircare Expert",
            AgentKind::WebSearch => "Web Search Assistant",
        }
    }
}

/// Result of query classification. Produced per request, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub agent_type: AgentKind,
    pub confidence: f64,
    pub reasoning: String,
    pub extracted_intent: String,
}
