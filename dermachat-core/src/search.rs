//! Vector store query layer — cosine similarity search over the product and
//! blog embedding tables.
//!
//! Similarity is `1 - (embedding <=> query_vector)`; only rows strictly above
//! the configured threshold are returned, ordered by similarity descending.
//! Optional filter predicates (brand/category/concerns for products,
//! author/tags for articles) are bound parameters — never interpolated into
//! the query text.

use async_trait::async_trait;
use pgvector::Vector;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::embeddings::EmbeddingBackend;

/// Maximum allowed limit for search results
const MAX_LIMIT: i64 = 20;

/// One product row above the similarity threshold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    pub id: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub concerns: Option<Vec<String>>,
    pub similarity: f64,
}

/// One blog/article row above the similarity threshold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArticleHit {
    pub id: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source_link: Option<String>,
    pub blog_folder: Option<String>,
    pub similarity: f64,
}

/// Exact-match / array-overlap filters for product search.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ProductFilters {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub concerns: Option<Vec<String>>,
}

impl ProductFilters {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none() && self.category.is_none() && self.concerns.is_none()
    }
}

/// Exact-match / array-overlap filters for article search.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ArticleFilters {
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ArticleFilters {
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.tags.is_none()
    }
}

/// Nearest-neighbor search over the two embedding collections. Injected into
/// the specialists so the pipeline can run against a fake in tests.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search_products(
        &self,
        query: &str,
        limit: u32,
        filters: Option<ProductFilters>,
    ) -> anyhow::Result<Vec<ProductHit>>;

    async fn search_articles(
        &self,
        query: &str,
        limit: u32,
        filters: Option<ArticleFilters>,
    ) -> anyhow::Result<Vec<ArticleHit>>;
}

/// pgvector-backed store: embeds the query with RETRIEVAL_QUERY intent, then
/// runs a parameterized cosine-distance query.
pub struct PgVectorStore {
    pool: PgPool,
    embedder: Arc<dyn EmbeddingBackend>,
    threshold: f64,
}

impl PgVectorStore {
    pub fn new(pool: PgPool, embedder: Arc<dyn EmbeddingBackend>, threshold: f64) -> Self {
        Self {
            pool,
            embedder,
            threshold,
        }
    }

    async fn embed_query(&self, query: &str) -> anyhow::Result<Vector> {
        let values = self.embedder.embed_query(query).await?;
        Ok(Vector::from(values))
    }
}

fn clamp_limit(limit: u32) -> i64 {
    (limit as i64).clamp(1, MAX_LIMIT)
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn search_products(
        &self,
        query: &str,
        limit: u32,
        filters: Option<ProductFilters>,
    ) -> anyhow::Result<Vec<ProductHit>> {
        let vector = self.embed_query(query).await?;
        let filters = filters.unwrap_or_default();

        let hits = sqlx::query_as::<_, ProductHit>(
            r#"
            SELECT
                id::text AS id,
                content,
                metadata,
                "productName" AS product_name,
                brand,
                category,
                concerns,
                1 - (embedding <=> $1::vector) AS similarity
            FROM product_embeddings
            WHERE 1 - (embedding <=> $1::vector) > $2
              AND ($4::text IS NULL OR brand = $4)
              AND ($5::text IS NULL OR category = $5)
              AND ($6::text[] IS NULL OR concerns && $6)
            ORDER BY similarity DESC
            LIMIT $3
            "#,
        )
        .bind(&vector)
        .bind(self.threshold)
        .bind(clamp_limit(limit))
        .bind(filters.brand)
        .bind(filters.category)
        .bind(filters.concerns)
        .fetch_all(&self.pool)
        .await?;

        Ok(hits)
    }

    async fn search_articles(
        &self,
        query: &str,
        limit: u32,
        filters: Option<ArticleFilters>,
    ) -> anyhow::Result<Vec<ArticleHit>> {
        let vector = self.embed_query(query).await?;
        let filters = filters.unwrap_or_default();

        let hits = sqlx::query_as::<_, ArticleHit>(
            r#"
            SELECT
                id::text AS id,
                content,
                metadata,
                "blogTitle" AS title,
                author,
                tags,
                "sourceLink" AS source_link,
                "blogFolder" AS blog_folder,
                1 - (embedding <=> $1::vector) AS similarity
            FROM blog_embeddings
            WHERE 1 - (embedding <=> $1::vector) > $2
              AND ($4::text IS NULL OR author = $4)
              AND ($5::text[] IS NULL OR tags && $5)
            ORDER BY similarity DESC
            LIMIT $3
            "#,
        )
        .bind(&vector)
        .bind(self.threshold)
        .bind(clamp_limit(limit))
        .bind(filters.author)
        .bind(filters.tags)
        .fetch_all(&self.pool)
        .await?;

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingClientConfig, GeminiEmbeddingClient};

    #[test]
    fn test_clamp_limit_bounds() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(500), MAX_LIMIT);
    }

    #[test]
    fn test_filters_emptiness() {
        assert!(ProductFilters::default().is_empty());
        assert!(!ProductFilters {
            brand: Some("Cetaphil".to_string()),
            ..Default::default()
        }
        .is_empty());
        assert!(ArticleFilters::default().is_empty());
    }

    /// Helper — returns None if DB or API key unavailable, so the test skips.
    async fn make_store() -> Option<PgVectorStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        let config = EmbeddingClientConfig::new(None, "gemini-embedding-001".to_string(), 3072);
        let embedder = GeminiEmbeddingClient::new(config).ok()?;
        Some(PgVectorStore::new(pool, Arc::new(embedder), 0.5))
    }

    #[tokio::test]
    async fn test_search_products_respects_threshold_and_order() {
        let store = match make_store().await {
            Some(s) => s,
            None => {
                eprintln!("Skipping test_search_products_respects_threshold_and_order: DB or API key unavailable");
                return;
            }
        };

        let hits = match store.search_products("moisturizer for dry skin", 10, None).await {
            Ok(h) => h,
            Err(e) => {
                eprintln!("Skipping: search failed ({})", e);
                return;
            }
        };

        for pair in hits.windows(2) {
            assert!(
                pair[0].similarity >= pair[1].similarity,
                "results must be ordered by similarity descending"
            );
        }
        for hit in &hits {
            assert!(hit.similarity > 0.5, "similarity must be strictly above threshold");
        }
    }
}
