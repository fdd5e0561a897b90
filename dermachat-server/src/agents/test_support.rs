//! Fake providers for pipeline unit tests — no live LLM, DB, or search API.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use dermachat_core::llm::{ChatBackend, ChatOptions, LlmError};
use dermachat_core::search::{
    ArticleFilters, ArticleHit, ProductFilters, ProductHit, VectorStore,
};
use dermachat_core::websearch::{WebHit, WebSearchBackend, WebSearchError};

enum LlmMode {
    Reply(String),
    Scripted(Mutex<VecDeque<String>>),
    Fail,
    Panic,
}

/// Fake chat backend. Records every user prompt it receives.
pub struct FakeLlm {
    mode: LlmMode,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    /// Always returns the same reply.
    pub fn replying(reply: &str) -> Self {
        Self {
            mode: LlmMode::Reply(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns replies in order; repeats the last one when exhausted.
    pub fn scripted(replies: Vec<&str>) -> Self {
        Self {
            mode: LlmMode::Scripted(Mutex::new(
                replies.into_iter().map(String::from).collect(),
            )),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always errors.
    pub fn failing() -> Self {
        Self {
            mode: LlmMode::Fail,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Panics when called — asserts a path makes no LLM call.
    pub fn panicking() -> Self {
        Self {
            mode: LlmMode::Panic,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_user_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for FakeLlm {
    async fn complete(
        &self,
        _system: &str,
        user: &str,
        _options: ChatOptions,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(user.to_string());
        match &self.mode {
            LlmMode::Reply(r) => Ok(r.clone()),
            LlmMode::Scripted(queue) => {
                let mut q = queue.lock().unwrap();
                if q.len() > 1 {
                    Ok(q.pop_front().unwrap())
                } else {
                    q.front().cloned().ok_or(LlmError::EmptyCompletion)
                }
            }
            LlmMode::Fail => Err(LlmError::Api {
                code: 500,
                message: "fake provider failure".to_string(),
            }),
            LlmMode::Panic => panic!("LLM must not be called on this path"),
        }
    }

    fn name(&self) -> &str {
        "fake-llm"
    }
}

/// Fake vector store with canned hits.
#[derive(Default)]
pub struct FakeStore {
    pub products: Vec<ProductHit>,
    pub articles: Vec<ArticleHit>,
}

impl FakeStore {
    pub fn with_products(products: Vec<ProductHit>) -> Self {
        Self {
            products,
            articles: Vec::new(),
        }
    }

    pub fn with_articles(articles: Vec<ArticleHit>) -> Self {
        Self {
            products: Vec::new(),
            articles,
        }
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn search_products(
        &self,
        _query: &str,
        limit: u32,
        _filters: Option<ProductFilters>,
    ) -> anyhow::Result<Vec<ProductHit>> {
        Ok(self.products.iter().take(limit as usize).cloned().collect())
    }

    async fn search_articles(
        &self,
        _query: &str,
        limit: u32,
        _filters: Option<ArticleFilters>,
    ) -> anyhow::Result<Vec<ArticleHit>> {
        Ok(self.articles.iter().take(limit as usize).cloned().collect())
    }
}

/// Fake web search backend.
pub enum FakeWebSearch {
    Hits(Vec<WebHit>),
    AuthError,
    Error,
}

#[async_trait]
impl WebSearchBackend for FakeWebSearch {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<WebHit>, WebSearchError> {
        match self {
            FakeWebSearch::Hits(hits) => Ok(hits.iter().take(limit).cloned().collect()),
            FakeWebSearch::AuthError => {
                Err(WebSearchError::Auth("invalid API key".to_string()))
            }
            FakeWebSearch::Error => Err(WebSearchError::Api {
                code: 500,
                message: "search backend down".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "fake-web"
    }
}
