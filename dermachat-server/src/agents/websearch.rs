//! Web search specialist — handles queries outside the skincare/haircare
//! domain with an external search instead of the internal vector store.
//!
//! The one place in the pipeline with an explicit error taxonomy: a provider
//! auth/configuration failure gets a different user-facing message than a
//! transient failure.

use std::sync::Arc;

use async_trait::async_trait;
use dermachat_core::llm::{ChatBackend, ChatOptions};
use dermachat_core::models::{RetrievalOutcome, RetrievedItem};
use dermachat_core::websearch::WebSearchBackend;

use super::{effective_query, Specialist};

const SYSTEM_PROMPT: &str = r#"You are a helpful assistant for Dermachat, a skincare and haircare platform.

The user has asked a question that is outside our core expertise of skincare and haircare.
You have been provided with web search results to help answer their question.

Guidelines:
1. Use the search results to provide an accurate, helpful answer
2. Be concise but informative
3. Cite sources when providing specific facts
4. If the search results don't fully answer the question, acknowledge this
5. Gently remind the user that Dermachat specializes in skincare and haircare if relevant
6. Be friendly and helpful even for off-topic questions"#;

const NO_MATCH_MESSAGE: &str = "I could not find relevant information for your query on the web.";

const AUTH_ERROR_MESSAGE: &str = "Web search is currently unavailable. Please try again later or ask a skincare/haircare related question.";

const ERROR_MESSAGE: &str = "An error occurred while searching the web. Please try again.";

/// Body excerpt length in the LLM context.
const BODY_EXCERPT_CHARS: usize = 500;

pub struct WebSpecialist {
    search: Arc<dyn WebSearchBackend>,
    llm: Arc<dyn ChatBackend>,
    limit: usize,
}

impl WebSpecialist {
    pub fn new(search: Arc<dyn WebSearchBackend>, llm: Arc<dyn ChatBackend>, limit: usize) -> Self {
        Self { search, llm, limit }
    }

    async fn retrieve_inner(&self, query: &str, intent: &str) -> RetrievalOutcome {
        let search_query = effective_query(query, intent);

        let hits = match self.search.search(search_query, self.limit).await {
            Ok(h) => h,
            Err(e) if e.is_auth() => {
                tracing::error!(error = %e, "Web search auth/configuration failure");
                return RetrievalOutcome::failure_with_error(
                    AUTH_ERROR_MESSAGE,
                    "API configuration error",
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Web search failed");
                return RetrievalOutcome::failure_with_error(ERROR_MESSAGE, e.to_string());
            }
        };

        if hits.is_empty() {
            return RetrievalOutcome::failure(NO_MATCH_MESSAGE);
        }

        let items: Vec<RetrievedItem> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| RetrievedItem::Web {
                rank: i + 1,
                title: hit.title.clone(),
                url: hit.url.clone(),
                text: hit.text.clone(),
                highlights: hit.highlights.clone(),
            })
            .collect();

        let context_text = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let highlights = if hit.highlights.is_empty() {
                    String::new()
                } else {
                    format!("Key Points: {}\n", hit.highlights.join(" "))
                };
                let body = hit
                    .text
                    .as_deref()
                    .map(|t| truncate(t, BODY_EXCERPT_CHARS))
                    .unwrap_or_else(|| "No content available".to_string());
                format!(
                    "[Source {}: \"{}\"]\nURL: {}\n{}Content: {}...",
                    i + 1,
                    hit.title.as_deref().unwrap_or("Untitled"),
                    hit.url,
                    highlights,
                    body
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let user_prompt = format!(
            "User Query: {query}\n\nWeb Search Results:\n{context_text}\n\nBased on the above search results, provide a helpful response to the user's query."
        );

        match self
            .llm
            .complete(SYSTEM_PROMPT, &user_prompt, ChatOptions::with_temperature(0.5))
            .await
        {
            Ok(answer) => RetrievalOutcome {
                success: true,
                answer,
                retrieved_count: items.len(),
                items,
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Web search LLM call failed");
                RetrievalOutcome::failure_with_error(ERROR_MESSAGE, e.to_string())
            }
        }
    }
}

/// Cut at a char boundary at most `max` bytes in.
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[async_trait]
impl Specialist for WebSpecialist {
    async fn retrieve(&self, query: &str, intent: &str) -> RetrievalOutcome {
        self.retrieve_inner(query, intent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{FakeLlm, FakeWebSearch};
    use dermachat_core::websearch::WebHit;

    fn hit(title: &str, url: &str) -> WebHit {
        WebHit {
            title: Some(title.to_string()),
            url: url.to_string(),
            text: Some("Sunny with light winds through the weekend.".to_string()),
            highlights: vec!["Sunny all week.".to_string()],
            published_date: None,
        }
    }

    #[tokio::test]
    async fn test_success_builds_context_from_results() {
        let search = FakeWebSearch::Hits(vec![hit("Tokyo Weather", "https://example.com/w")]);
        let llm = Arc::new(FakeLlm::replying("It's sunny in Tokyo."));
        let specialist = WebSpecialist::new(Arc::new(search), llm.clone(), 5);

        let outcome = specialist.retrieve("what's the weather in Tokyo", "").await;

        assert!(outcome.success);
        assert_eq!(outcome.retrieved_count, 1);
        assert_eq!(outcome.items[0].url(), Some("https://example.com/w"));

        let prompt = llm.last_user_prompt();
        assert!(prompt.contains("[Source 1: \"Tokyo Weather\"]"));
        assert!(prompt.contains("URL: https://example.com/w"));
        assert!(prompt.contains("Key Points: Sunny all week."));
    }

    #[tokio::test]
    async fn test_auth_error_gets_dedicated_message() {
        let specialist = WebSpecialist::new(
            Arc::new(FakeWebSearch::AuthError),
            Arc::new(FakeLlm::panicking()),
            5,
        );

        let outcome = specialist.retrieve("anything", "").await;

        assert!(!outcome.success);
        assert_eq!(outcome.answer, AUTH_ERROR_MESSAGE);
        assert_eq!(outcome.error.as_deref(), Some("API configuration error"));
    }

    #[tokio::test]
    async fn test_generic_error_gets_generic_message() {
        let specialist = WebSpecialist::new(
            Arc::new(FakeWebSearch::Error),
            Arc::new(FakeLlm::panicking()),
            5,
        );

        let outcome = specialist.retrieve("anything", "").await;

        assert!(!outcome.success);
        assert_eq!(outcome.answer, ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_zero_results_is_structured_failure() {
        let specialist = WebSpecialist::new(
            Arc::new(FakeWebSearch::Hits(vec![])),
            Arc::new(FakeLlm::panicking()),
            5,
        );

        let outcome = specialist.retrieve("anything", "").await;
        assert!(!outcome.success);
        assert_eq!(outcome.answer, NO_MATCH_MESSAGE);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let t = truncate(s, 3);
        assert!(t.len() <= 3);
        assert!(s.starts_with(&t));
        assert_eq!(truncate("short", 500), "short");
    }
}
