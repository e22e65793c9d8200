//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;

use crate::embeddings::Embedding;
use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `HuggingFaceEmbedder`: Hugging Face feature-extraction inference (all-MiniLM-L6-v2)
///
/// Every returned vector has exactly [`EmbeddingProvider::dimensions`] finite
/// components; a response of any other shape is an error, never truncated or padded.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Get embedding dimensions (384 for all-MiniLM-L6-v2)
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
