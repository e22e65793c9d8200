//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;

use crate::embeddings::Embedding;
use crate::error::Result;
use crate::types::{DocumentRow, RetrievedChunk};

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `SqliteVectorStore`: local SQLite file with exact cosine search
/// - `PostgrestVectorStore`: pgvector behind PostgREST (`match_documents` rpc)
///
/// Rows are immutable once written; there is no update or delete path.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert rows, returning how many were written
    async fn insert_rows(&self, rows: &[DocumentRow]) -> Result<usize>;

    /// Whether a row with this content hash is already stored
    async fn contains_hash(&self, content_hash: &str) -> Result<bool>;

    /// Nearest rows to `query`, best match first
    ///
    /// An empty store yields an empty result, not an error.
    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<RetrievedChunk>>;

    /// Get total number of rows stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
