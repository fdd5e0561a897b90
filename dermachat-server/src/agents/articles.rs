//! Article/blog solution finder — educational answers grounded in the blog
//! knowledge base.

use std::sync::Arc;

use async_trait::async_trait;
use dermachat_core::llm::{ChatBackend, ChatOptions};
use dermachat_core::models::{RetrievalOutcome, RetrievedItem};
use dermachat_core::search::VectorStore;

use super::{effective_query, Specialist};

const SYSTEM_PROMPT: &str = r#"You are a Skincare & Haircare Expert for Dermachat, an online dermatology and skincare platform.

Your role is to provide helpful, educational information about skincare and haircare based on the blog content provided to you.

Guidelines:
1. Only use information from the provided blog content - don't make up facts
2. Provide clear, actionable advice
3. Explain the science/reasoning behind recommendations when available
4. Be empathetic and understanding of skin/hair concerns
5. Always recommend consulting a dermatologist for serious or persistent issues
6. Cite the source blog when providing specific information
7. If the provided content doesn't fully answer the question, be honest about limitations

Format your response:
- Start with a direct answer to the user's question
- Provide supporting details and explanations
- Include practical tips when relevant
- Mention if professional consultation is recommended"#;

const NO_MATCH_MESSAGE: &str =
    "I could not find relevant information in our knowledge base for your query.";

const ERROR_MESSAGE: &str = "An error occurred while searching for information.";

pub struct ArticleSpecialist {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn ChatBackend>,
    limit: u32,
}

impl ArticleSpecialist {
    pub fn new(store: Arc<dyn VectorStore>, llm: Arc<dyn ChatBackend>, limit: u32) -> Self {
        Self { store, llm, limit }
    }

    async fn retrieve_inner(&self, query: &str, intent: &str) -> RetrievalOutcome {
        let search_query = effective_query(query, intent);

        let hits = match self.store.search_articles(search_query, self.limit, None).await {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(error = %e, "Article search failed");
                return RetrievalOutcome::failure_with_error(ERROR_MESSAGE, e.to_string());
            }
        };

        if hits.is_empty() {
            return RetrievalOutcome::failure(NO_MATCH_MESSAGE);
        }

        let items: Vec<RetrievedItem> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| RetrievedItem::Article {
                rank: i + 1,
                content: hit.content.clone(),
                title: hit.title.clone(),
                author: hit.author.clone(),
                tags: hit.tags.clone().unwrap_or_default(),
                source_link: hit.source_link.clone(),
                similarity: hit.similarity,
            })
            .collect();

        let context_text = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let tags = match &hit.tags {
                    Some(tags) if !tags.is_empty() => tags.join(", "),
                    _ => "N/A".to_string(),
                };
                format!(
                    "[Source {}: \"{}\" by {}]\n{}\nTags: {}\nSimilarity Score: {:.3}",
                    i + 1,
                    hit.title.as_deref().unwrap_or("Untitled"),
                    hit.author.as_deref().unwrap_or("Unknown"),
                    hit.content,
                    tags,
                    hit.similarity
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let user_prompt = format!(
            "User Query: {query}\n\nRelevant Blog Content from Knowledge Base:\n{context_text}\n\nBased on the above information, provide a helpful and informative response to the user's query."
        );

        match self
            .llm
            .complete(SYSTEM_PROMPT, &user_prompt, ChatOptions::with_temperature(0.4))
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
                tracing::error!(error = %e, "Article finder LLM call failed");
                RetrievalOutcome::failure_with_error(ERROR_MESSAGE, e.to_string())
            }
        }
    }
}

#[async_trait]
impl Specialist for ArticleSpecialist {
    async fn retrieve(&self, query: &str, intent: &str) -> RetrievalOutcome {
        self.retrieve_inner(query, intent).await
    }
}
