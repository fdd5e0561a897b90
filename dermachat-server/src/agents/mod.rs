//! The agent pipeline: classifier -> specialist -> synthesizer, sequenced by
//! the orchestrator.

pub mod articles;
pub mod classifier;
pub mod orchestrator;
pub mod products;
pub mod synthesizer;
pub mod websearch;

#[cfg(test)]
pub(crate) mod test_support;

use async_trait::async_trait;
use dermachat_core::models::RetrievalOutcome;

/// Common capability of the three retrieval specialists. Implementations
/// never return an error — every failure mode is a structured
/// `RetrievalOutcome` with `success: false`.
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Retrieve grounding context for `query` (preferring `intent` when
    /// non-empty) and produce a grounded answer.
    async fn retrieve(&self, query: &str, intent: &str) -> RetrievalOutcome;
}

/// Empty intent means intent extraction failed; fall back to the raw query.
pub(crate) fn effective_query<'a>(query: &'a str, intent: &'a str) -> &'a str {
    if intent.trim().is_empty() {
        query
    } else {
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_query_prefers_intent() {
        assert_eq!(effective_query("raw", "intent"), "intent");
        assert_eq!(effective_query("raw", ""), "raw");
        assert_eq!(effective_query("raw", "   "), "raw");
    }
}
