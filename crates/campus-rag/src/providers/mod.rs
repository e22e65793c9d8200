//! Provider abstractions for embeddings, generation, vector storage,
//! conversation history, speech and caller authentication
//!
//! Every external collaborator sits behind a trait so the pipelines can be
//! wired with real clients at start-up and with fakes in tests.

pub mod auth;
pub mod conversation_store;
pub mod embedding;
pub mod huggingface;
pub mod llm;
pub mod openrouter;
pub mod postgrest;
pub mod speech;
pub mod sqlite;
pub mod vector_store;

pub use auth::{Authorizer, Caller, StaticTokenAuthorizer};
pub use conversation_store::ConversationStore;
pub use embedding::EmbeddingProvider;
pub use huggingface::HuggingFaceEmbedder;
pub use llm::{ChatPrompt, LlmProvider};
pub use openrouter::OpenRouterClient;
pub use postgrest::PostgrestVectorStore;
pub use speech::{SpeechProvider, SpeechSynthesizer};
pub use sqlite::{SqliteConversationStore, SqliteVectorStore};
pub use vector_store::VectorStoreProvider;

use std::sync::Arc;

use crate::config::{RagConfig, VectorBackend};
use crate::error::Result;

/// Open the vector store backend selected in `config`
pub fn vector_store_from_config(config: &RagConfig) -> Result<Arc<dyn VectorStoreProvider>> {
    let dimensions = config.embeddings.dimensions;
    Ok(match config.vector_store.backend {
        VectorBackend::Sqlite => {
            tracing::info!(
                "Using SQLite vector store at {}",
                config.vector_store.storage_path.display()
            );
            Arc::new(SqliteVectorStore::open(
                &config.vector_store.storage_path,
                dimensions,
            )?)
        }
        VectorBackend::Postgrest => {
            tracing::info!("Using PostgREST vector store");
            Arc::new(PostgrestVectorStore::new(&config.vector_store, dimensions)?)
        }
    })
}
