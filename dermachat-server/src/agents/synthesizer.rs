//! Response synthesizer — rewrites the specialist's raw answer into the
//! platform's conversational tone, with short-term conversation history.
//!
//! Both entry points catch LLM failures and fall back to hardcoded apology
//! strings; synthesis never propagates an error.

use std::sync::Arc;

use dermachat_core::llm::{ChatBackend, ChatOptions};
use dermachat_core::models::{AgentKind, RetrievalOutcome};
use dermachat_core::session::Exchange;

const SYSTEM_PROMPT: &str = r#"You are a friendly and knowledgeable customer service representative for Dermachat, an online dermatology and skincare platform.

Your role is to take the information gathered by our specialist agents and present it in a conversational, helpful manner to the user.

Guidelines:
1. Be warm, friendly, and professional
2. Present information clearly and concisely
3. Use simple language - avoid medical jargon unless necessary
4. Structure long responses with bullet points or numbered lists
5. Always end with an invitation for follow-up questions
6. Remind users to consult dermatologists for serious concerns
7. If the specialist couldn't find good information, be honest and helpful

Tone: Friendly, knowledgeable, caring, professional"#;

const SYNTHESIS_FALLBACK: &str = "I apologize, but I'm having trouble generating a response right now. Please try again or contact our support team for assistance.";

const FAILED_RETRIEVAL_FALLBACK: &str = "I couldn't find specific information for your query. Please try rephrasing or consult with a dermatologist for personalized advice.";

pub struct ResponseSynthesizer {
    llm: Arc<dyn ChatBackend>,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn ChatBackend>) -> Self {
        Self { llm }
    }

    /// Synthesize the final reply from a successful specialist outcome.
    pub async fn respond(
        &self,
        query: &str,
        outcome: &RetrievalOutcome,
        agent: AgentKind,
        history: &[Exchange],
    ) -> String {
        let user_prompt = format!(
            "Previous Conversation:\n{}\n\nCurrent User Query: {}\n\nInformation from {}:\n{}\n\nRetrieved {} relevant items from our knowledge base.\n\nPlease provide a conversational response to the user based on the above information. Make it engaging and helpful.",
            format_history(history),
            query,
            agent.specialist_name(),
            outcome.answer,
            outcome.retrieved_count
        );

        match self
            .llm
            .complete(SYSTEM_PROMPT, &user_prompt, ChatOptions::with_temperature(0.6))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Synthesis LLM call failed");
                SYNTHESIS_FALLBACK.to_string()
            }
        }
    }

    /// Synthesize a best-effort reply when retrieval found nothing.
    pub async fn handle_failed_retrieval(&self, query: &str, agent: AgentKind) -> String {
        let source = match agent {
            AgentKind::ProductRecommender => "product database",
            AgentKind::BlogSolutionFinder => "knowledge base",
            AgentKind::WebSearch => "web search",
        };

        let user_prompt = format!(
            "The user asked: \"{query}\"\n\nUnfortunately, our {source} didn't have relevant information for this query.\n\nPlease provide a helpful response that:\n1. Acknowledges we couldn't find specific information\n2. Offers general guidance if possible\n3. Suggests they might want to consult with a dermatologist\n4. Invites them to ask other questions or rephrase their query"
        );

        match self
            .llm
            .complete(SYSTEM_PROMPT, &user_prompt, ChatOptions::with_temperature(0.6))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed-retrieval synthesis LLM call failed");
                FAILED_RETRIEVAL_FALLBACK.to_string()
            }
        }
    }
}

fn format_history(history: &[Exchange]) -> String {
    if history.is_empty() {
        return "No previous conversation.".to_string();
    }
    history
        .iter()
        .map(|h| format!("User: {}\nAssistant: {}", h.user, h.assistant))
        .collect::<Vec<_>>()
        .join("\n\n")
}
