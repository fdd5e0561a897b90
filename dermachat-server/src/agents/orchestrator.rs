//! Orchestrator — sequences classifier, specialist, and synthesizer for one
//! chat turn: ANALYZE -> ROUTE -> RETRIEVE -> SYNTHESIZE -> DONE.
//!
//! Retrieval failure is never fatal: the failed-retrieval synthesis branch
//! still produces a best-effort answer. Anything unexpected is caught once at
//! this boundary and becomes a uniform apologetic reply.

use std::sync::Arc;
use std::time::Instant;

use dermachat_core::models::{
    AgentKind, ChatMetadata, ChatOutcome, QueryAnalysisMeta, RetrievalMeta, SourceRef,
};
use dermachat_core::session::SessionStore;

use super::articles::ArticleSpecialist;
use super::classifier::QueryClassifier;
use super::products::ProductSpecialist;
use super::synthesizer::ResponseSynthesizer;
use super::websearch::WebSpecialist;
use super::Specialist;

const PIPELINE_ERROR_MESSAGE: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

pub struct Orchestrator {
    classifier: QueryClassifier,
    products: ProductSpecialist,
    articles: ArticleSpecialist,
    web: WebSpecialist,
    synthesizer: ResponseSynthesizer,
    sessions: Arc<SessionStore>,
    synthesis_window: usize,
}

impl Orchestrator {
    pub fn new(
        classifier: QueryClassifier,
        products: ProductSpecialist,
        articles: ArticleSpecialist,
        web: WebSpecialist,
        synthesizer: ResponseSynthesizer,
        sessions: Arc<SessionStore>,
        synthesis_window: usize,
    ) -> Self {
        Self {
            classifier,
            products,
            articles,
            web,
            synthesizer,
            sessions,
            synthesis_window,
        }
    }

    /// Session history store, shared with the HTTP history endpoints.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Run the full pipeline for one user message. Never errors: any failure
    /// becomes a uniform apologetic outcome with elapsed time attached.
    pub async fn process(&self, query: &str, session_id: &str) -> ChatOutcome {
        let start = Instant::now();

        match self.process_inner(query, session_id, start).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, session_id, "Pipeline error");
                ChatOutcome {
                    success: false,
                    response: PIPELINE_ERROR_MESSAGE.to_string(),
                    metadata: ChatMetadata {
                        session_id: session_id.to_string(),
                        processing_time_ms: start.elapsed().as_millis() as u64,
                        query_analysis: None,
                        retrieval: None,
                    },
                    sources: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn process_inner(
        &self,
        query: &str,
        session_id: &str,
        start: Instant,
    ) -> anyhow::Result<ChatOutcome> {
        // History is snapshotted before this turn is appended.
        let history = self.sessions.recent(session_id, self.synthesis_window).await;

        // ANALYZE
        let analysis = self.classifier.classify(query).await;
        tracing::info!(
            agent = analysis.agent_type.label(),
            confidence = analysis.confidence,
            "Query classified"
        );

        // ROUTE — exhaustive over the three agents
        let specialist: &dyn Specialist = match analysis.agent_type {
            AgentKind::ProductRecommender => &self.products,
            AgentKind::BlogSolutionFinder => &self.articles,
            AgentKind::WebSearch => &self.web,
        };

        // RETRIEVE
        let outcome = specialist
            .retrieve(query, &analysis.extracted_intent)
            .await;
        if let Some(err) = &outcome.error {
            tracing::warn!(error = %err, agent = analysis.agent_type.label(), "Specialist reported a provider failure");
        }

        // SYNTHESIZE — success or failed-retrieval variant
        let response = if outcome.success {
            self.synthesizer
                .respond(query, &outcome, analysis.agent_type, &history)
                .await
        } else {
            self.synthesizer
                .handle_failed_retrieval(query, analysis.agent_type)
                .await
        };

        self.sessions
            .append(session_id, query.to_string(), response.clone())
            .await;

        let sources: Vec<SourceRef> = outcome
            .items
            .iter()
            .take(3)
            .map(|item| SourceRef {
                title: item.title().map(String::from),
                url: item.url().map(String::from),
                kind: analysis.agent_type.source_kind(),
            })
            .collect();

        Ok(ChatOutcome {
            success: true,
            response,
            metadata: ChatMetadata {
                session_id: session_id.to_string(),
                processing_time_ms: start.elapsed().as_millis() as u64,
                query_analysis: Some(QueryAnalysisMeta {
                    agent_type: analysis.agent_type,
                    confidence: analysis.confidence,
                    reasoning: analysis.reasoning,
                }),
                retrieval: Some(RetrievalMeta {
                    success: outcome.success,
                    sources_count: outcome.retrieved_count,
                }),
            },
            sources,
            error: None,
        })
    }
}
