//! RAG Server binary
//!
//! Run with: cargo run -p campus-rag --bin campus-rag-server

use campus_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                       Campus RAG                          ║
║        University Q&A grounded in official records        ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration ($CAMPUS_RAG_CONFIG, then environment overrides)
    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Chunk size: {} words", config.chunking.max_words);
    tracing::info!("  - Vector store: {:?}", config.vector_store.backend);

    if config.embeddings.api_key.is_none() {
        tracing::warn!("HUGGINGFACE_API_KEY is not set; embedding and speech calls will fail");
    }
    if config.llm.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; answer generation will fail");
    }

    // Create and start server
    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/documents - Ingest a document (admin)");
    println!("  POST /api/chat      - Ask questions");
    println!("  POST /api/embed     - Embed text");
    println!("  POST /api/tts       - Text to speech");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
