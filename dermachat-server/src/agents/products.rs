//! Product recommendation specialist — similarity search over the product
//! catalog, then one grounded LLM call over the retrieved context.

use std::sync::Arc;

use async_trait::async_trait;
use dermachat_core::llm::{ChatBackend, ChatOptions};
use dermachat_core::models::{RetrievalOutcome, RetrievedItem};
use dermachat_core::search::VectorStore;

use super::{effective_query, Specialist};

const SYSTEM_PROMPT: &str = r#"You are a Product Recommendation Specialist for Dermachat, an online dermatology and skincare platform.

Your role is to recommend suitable skincare and haircare products based on user needs and the product information provided to you.

Guidelines:
1. Only recommend products from the context provided - never make up product names
2. Explain WHY each product is suitable for the user's needs
3. Consider the user's specific concerns (skin type, conditions, goals)
4. Mention key ingredients and their benefits when relevant
5. If multiple products are suitable, rank them by relevance
6. Be honest if the available products don't perfectly match the user's needs
7. Always encourage consulting a dermatologist for serious concerns

Format your recommendations clearly with:
- Product name and brand (if available)
- Why it's recommended
- Key benefits/ingredients
- Any usage tips"#;

const NO_MATCH_MESSAGE: &str =
    "I could not find any products matching your requirements in our database.";

const ERROR_MESSAGE: &str = "An error occurred while searching for product recommendations.";

pub struct ProductSpecialist {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn ChatBackend>,
    limit: u32,
}

impl ProductSpecialist {
    pub fn new(store: Arc<dyn VectorStore>, llm: Arc<dyn ChatBackend>, limit: u32) -> Self {
        Self { store, llm, limit }
    }

    async fn retrieve_inner(&self, query: &str, intent: &str) -> RetrievalOutcome {
        let search_query = effective_query(query, intent);

        let hits = match self.store.search_products(search_query, self.limit, None).await {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(error = %e, "Product search failed");
                return RetrievalOutcome::failure_with_error(ERROR_MESSAGE, e.to_string());
            }
        };

        if hits.is_empty() {
            // No grounding context — answering anyway would invite hallucination.
            return RetrievalOutcome::failure(NO_MATCH_MESSAGE);
        }

        let items: Vec<RetrievedItem> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| RetrievedItem::Product {
                rank: i + 1,
                content: hit.content.clone(),
                product_name: hit.product_name.clone(),
                brand: hit.brand.clone(),
                category: hit.category.clone(),
                similarity: hit.similarity,
            })
            .collect();

        let context_text = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                format!(
                    "[Product {}]\n{}\nSimilarity Score: {:.3}",
                    i + 1,
                    hit.content,
                    hit.similarity
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let user_prompt = format!(
            "User Query: {query}\n\nRelevant Products from Database:\n{context_text}\n\nBased on the above product information, provide personalized recommendations for the user's query."
        );

        match self
            .llm
            .complete(SYSTEM_PROMPT, &user_prompt, ChatOptions::with_temperature(0.3))
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
                tracing::error!(error = %e, "Product recommender LLM call failed");
                RetrievalOutcome::failure_with_error(ERROR_MESSAGE, e.to_string())
            }
        }
    }
}

#[async_trait]
impl Specialist for ProductSpecialist {
    async fn retrieve(&self, query: &str, intent: &str) -> RetrievalOutcome {
        self.retrieve_inner(query, intent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::{FakeLlm, FakeStore};
    use dermachat_core::search::ProductHit;

    fn hit(name: &str, similarity: f64) -> ProductHit {
        ProductHit {
            id: "p1".to_string(),
            content: format!("{name} — a gentle daily moisturizer"),
            metadata: None,
            product_name: Some(name.to_string()),
            brand: Some("DermaBrand".to_string()),
            category: Some("moisturizer".to_string()),
            concerns: Some(vec!["dry skin".to_string()]),
            similarity,
        }
    }

    #[tokio::test]
    async fn test_zero_hits_returns_canned_failure_without_llm_call() {
        let llm = Arc::new(FakeLlm::replying("must never be used"));
        let specialist =
            ProductSpecialist::new(Arc::new(FakeStore::default()), llm.clone(), 10);

        let outcome = specialist.retrieve("recommend a moisturizer", "").await;

        assert!(!outcome.success);
        assert_eq!(outcome.answer, NO_MATCH_MESSAGE);
        assert_eq!(outcome.retrieved_count, 0);
        assert!(outcome.items.is_empty());
        assert_eq!(llm.call_count(), 0, "empty retrieval must not reach the LLM");
    }

    #[tokio::test]
    async fn test_success_builds_ranked_context_and_returns_answer() {
        let store = FakeStore::with_products(vec![hit("HydraCalm", 0.91), hit("AquaSoft", 0.74)]);
        let llm = Arc::new(FakeLlm::replying("Try HydraCalm first."));
        let specialist = ProductSpecialist::new(Arc::new(store), llm.clone(), 10);

        let outcome = specialist
            .retrieve("recommend a moisturizer for dry skin", "moisturizer dry skin")
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.answer, "Try HydraCalm first.");
        assert_eq!(outcome.retrieved_count, 2);
        match &outcome.items[0] {
            RetrievedItem::Product { rank, product_name, similarity, .. } => {
                assert_eq!(*rank, 1);
                assert_eq!(product_name.as_deref(), Some("HydraCalm"));
                assert_eq!(*similarity, 0.91);
            }
            other => panic!("Expected product item, got {:?}", other),
        }

        let prompt = llm.last_user_prompt();
        assert!(prompt.contains("[Product 1]"));
        assert!(prompt.contains("Similarity Score: 0.910"));
        assert!(prompt.contains("User Query: recommend a moisturizer for dry skin"));
    }

    #[tokio::test]
    async fn test_llm_failure_becomes_structured_outcome() {
        let store = FakeStore::with_products(vec![hit("HydraCalm", 0.91)]);
        let specialist =
            ProductSpecialist::new(Arc::new(store), Arc::new(FakeLlm::failing()), 10);

        let outcome = specialist.retrieve("recommend a moisturizer", "").await;

        assert!(!outcome.success);
        assert_eq!(outcome.answer, ERROR_MESSAGE);
        assert!(outcome.error.is_some(), "provider error kept for logs");
    }
}
