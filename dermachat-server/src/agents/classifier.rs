//! Query classifier — decides which specialist handles a user query.
//!
//! Primary path is an LLM call with a strict JSON-output contract; any
//! failure (provider error, no JSON in the reply, unparseable JSON) degrades
//! to a deterministic keyword heuristic. Classification never fails.

use std::sync::Arc;

use dermachat_core::extract::parse_first_json_object;
use dermachat_core::llm::{ChatBackend, ChatOptions};
use dermachat_core::models::{AgentKind, Classification};

const SYSTEM_PROMPT: &str = r#"You are a query analyzer for a skincare and haircare platform called Dermachat.

Your job is to analyze user queries and determine which specialized agent should handle them.

There are THREE specialized agents:

1. PRODUCT_RECOMMENDER - Use this when the user:
   - Asks for product recommendations
   - Wants to find products for specific skin/hair concerns
   - Asks about specific products, brands, or ingredients
   - Wants to compare products
   - Asks "what should I use for..." type questions

2. BLOG_SOLUTION_FINDER - Use this when the user:
   - Asks for skincare/haircare tips or advice
   - Wants to learn about skincare/haircare routines
   - Asks about causes, symptoms, or treatments of skin/hair conditions
   - Wants educational content about ingredients or techniques
   - Asks "how do I..." or "why does..." type questions about skin/hair health

3. WEB_SEARCH - Use this when the user:
   - Asks about topics NOT related to skincare, haircare, or dermatology
   - Asks general knowledge questions
   - Asks about current events, news, or general information
   - Asks about topics outside our expertise (e.g., technology, sports, cooking, etc.)
   - The query doesn't fit into product recommendations or skincare/haircare advice

IMPORTANT: Only use WEB_SEARCH when the query is clearly unrelated to skincare/haircare. If there's any connection to skin, hair, beauty, or wellness, prefer the other agents.

Respond with ONLY a JSON object in this exact format:
{
  "agentType": "product_recommender" | "blog_solution_finder" | "web_search",
  "confidence": 0.0-1.0,
  "reasoning": "brief explanation",
  "extractedIntent": "what the user is looking for"
}"#;

const SKINCARE_KEYWORDS: &[&str] = &[
    "skin", "face", "acne", "pimple", "wrinkle", "moistur", "sunscreen", "glow", "dark spot",
    "pigment", "oily", "dry skin", "sensitive skin", "rash", "eczema", "dermat",
];

const HAIRCARE_KEYWORDS: &[&str] = &[
    "hair", "scalp", "dandruff", "hairfall", "hair fall", "shampoo", "conditioner", "frizz",
    "bald", "grey hair", "hair growth",
];

const PRODUCT_KEYWORDS: &[&str] = &[
    "recommend", "product", "buy", "best", "suggest", "which", "brand", "cream", "serum",
    "lotion", "gel", "oil",
];

pub struct QueryClassifier {
    llm: Arc<dyn ChatBackend>,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn ChatBackend>) -> Self {
        Self { llm }
    }

    /// Classify a query. Never errors: any LLM or parsing failure degrades to
    /// the keyword heuristic.
    pub async fn classify(&self, query: &str) -> Classification {
        let raw = match self
            .llm
            .complete(SYSTEM_PROMPT, query, ChatOptions::with_temperature(0.1))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Classifier LLM call failed, using keyword fallback");
                return keyword_fallback(query);
            }
        };

        match parse_llm_classification(&raw, query) {
            Some(c) => c,
            None => {
                tracing::warn!("No JSON object in classifier output, using keyword fallback");
                keyword_fallback(query)
            }
        }
    }
}

/// Parse the classifier's raw output; `None` when no usable JSON was found.
fn parse_llm_classification(raw: &str, query: &str) -> Option<Classification> {
    let value = parse_first_json_object(raw)?;

    let agent_type = match value["agentType"].as_str() {
        Some("product_recommender") => AgentKind::ProductRecommender,
        Some("blog_solution_finder") => AgentKind::BlogSolutionFinder,
        Some("web_search") => AgentKind::WebSearch,
        // Safe default for anything unrecognized
        _ => AgentKind::BlogSolutionFinder,
    };

    let confidence = value["confidence"]
        .as_f64()
        .filter(|c| (0.0..=1.0).contains(c))
        .unwrap_or(0.5);

    let reasoning = value["reasoning"].as_str().unwrap_or("").to_string();

    let extracted_intent = match value["extractedIntent"].as_str() {
        Some(intent) if !intent.trim().is_empty() => intent.to_string(),
        _ => query.to_string(),
    };

    Some(Classification {
        agent_type,
        confidence,
        reasoning,
        extracted_intent,
    })
}

/// Deterministic keyword heuristic used when the LLM path fails.
pub fn keyword_fallback(query: &str) -> Classification {
    let lower = query.to_lowercase();

    let domain_related = SKINCARE_KEYWORDS.iter().any(|k| lower.contains(k))
        || HAIRCARE_KEYWORDS.iter().any(|k| lower.contains(k));
    let has_product_keywords = PRODUCT_KEYWORDS.iter().any(|k| lower.contains(k));

    if domain_related {
        if has_product_keywords {
            return Classification {
                agent_type: AgentKind::ProductRecommender,
                confidence: 0.7,
                reasoning: "Keyword-based: skincare/haircare product query".to_string(),
                extracted_intent: query.to_string(),
            };
        }
        return Classification {
            agent_type: AgentKind::BlogSolutionFinder,
            confidence: 0.7,
            reasoning: "Keyword-based: skincare/haircare advice query".to_string(),
            extracted_intent: query.to_string(),
        };
    }

    Classification {
        agent_type: AgentKind::WebSearch,
        confidence: 0.5,
        reasoning: "Query does not appear related to skincare/haircare".to_string(),
        extracted_intent: query.to_string(),
    }
}
