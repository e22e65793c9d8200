//! API routes for the RAG server

pub mod chat;
pub mod embed;
pub mod ingest;
pub mod tts;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Allowance for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion replaces axum's 2MB default; the handler checks the file itself
        .route(
            "/documents",
            post(ingest::ingest_document).layer(DefaultBodyLimit::max(
                max_upload_size.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/chat", post(chat::chat))
        .route("/embed", post(embed::embed_text))
        .route("/tts", post(tts::synthesize))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "campus-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over university records with grounded and open-domain modes",
        "endpoints": {
            "POST /api/documents": "Ingest a .pdf/.txt file or pasted text (admin)",
            "POST /api/chat": "Ask a question, optionally continuing a conversation",
            "POST /api/embed": "Embed text with the configured model",
            "POST /api/tts": "Synthesize speech (audio/wav)",
            "GET /api/info": "This document"
        }
    }))
}
