use std::sync::Arc;

use clap::Parser;
use dermachat_core::embeddings::{EmbeddingClientConfig, GeminiEmbeddingClient};
use dermachat_core::llm::{ChatClientConfig, GeminiChatClient};
use dermachat_core::websearch::{DisabledWebSearch, ExaClientConfig, ExaSearchClient, WebSearchBackend};
use dermachat_core::{DermachatConfig, PgVectorStore, SessionStore};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use dermachat_server::agents::articles::ArticleSpecialist;
use dermachat_server::agents::classifier::QueryClassifier;
use dermachat_server::agents::orchestrator::Orchestrator;
use dermachat_server::agents::products::ProductSpecialist;
use dermachat_server::agents::synthesizer::ResponseSynthesizer;
use dermachat_server::agents::websearch::WebSpecialist;
use dermachat_server::http::{start_http_server, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "dermachat.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys come from the environment; .env is a local-dev convenience.
    dotenvy::dotenv().ok();

    let args = Args::parse();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match DermachatConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    let pool = match dermachat_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match dermachat_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        match dermachat_core::db::check_pgvector(&pool).await {
            Ok(v) => println!("✅ pgvector version: {}", v),
            Err(e) => {
                println!("❌ pgvector check failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Dermachat DB health check passed");
        return Ok(());
    }

    // Provider clients — LLM and embeddings are required, web search degrades.
    let llm = match GeminiChatClient::new(ChatClientConfig::from_config(&config.llm)) {
        Ok(c) => Arc::new(c) as Arc<dyn dermachat_core::ChatBackend>,
        Err(e) => {
            eprintln!("Failed to create LLM client (is GEMINI_API_KEY set?): {}", e);
            std::process::exit(1);
        }
    };

    let embedder = match GeminiEmbeddingClient::new(EmbeddingClientConfig::from_config(
        &config.embedding,
    )) {
        Ok(c) => Arc::new(c) as Arc<dyn dermachat_core::EmbeddingBackend>,
        Err(e) => {
            eprintln!("Failed to create embedding client (is GEMINI_API_KEY set?): {}", e);
            std::process::exit(1);
        }
    };

    let web_search: Arc<dyn WebSearchBackend> =
        match ExaSearchClient::new(ExaClientConfig::from_config(&config.websearch)) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::warn!(
                    "Web search disabled (is EXA_API_KEY set?): {} — off-domain queries will get a fallback message",
                    e
                );
                Arc::new(DisabledWebSearch)
            }
        };

    let store = Arc::new(PgVectorStore::new(
        pool.clone(),
        embedder,
        config.retrieval.similarity_threshold,
    ));

    let sessions = Arc::new(SessionStore::new(config.retrieval.history_limit));

    let orchestrator = Arc::new(Orchestrator::new(
        QueryClassifier::new(llm.clone()),
        ProductSpecialist::new(store.clone(), llm.clone(), config.retrieval.product_limit),
        ArticleSpecialist::new(store.clone(), llm.clone(), config.retrieval.article_limit),
        WebSpecialist::new(web_search, llm.clone(), config.websearch.result_limit),
        ResponseSynthesizer::new(llm),
        sessions,
        config.retrieval.synthesis_history_window,
    ));

    // Shutdown signal
    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = Arc::new(HttpState {
        pool,
        orchestrator,
        store,
    });

    start_http_server(state, &config, tx.subscribe()).await?;

    Ok(())
}
