//! In-process fakes for the model and storage providers

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::embeddings::{cosine_similarity, Embedding};
use crate::error::{Error, Result};
use crate::providers::{ChatPrompt, EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::types::{DocumentRow, RetrievedChunk};

pub const FAKE_DIMENSIONS: usize = 16;

/// Bag-of-words hashing embedder; texts sharing words land close together
#[derive(Default)]
pub struct FakeEmbedder {
    fail_on: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every text containing `needle`
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on.push(needle.into());
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = self.fail_on.iter().find(|n| text.contains(n.as_str())) {
            return Err(Error::embedding(format!("refusing text containing '{}'", needle)));
        }

        let mut values = vec![0.0f32; FAKE_DIMENSIONS];
        values[0] = 0.1;
        for word in text.split_whitespace() {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            values[digest[0] as usize % FAKE_DIMENSIONS] += 1.0;
        }
        Embedding::new(values, FAKE_DIMENSIONS)
    }

    fn dimensions(&self) -> usize {
        FAKE_DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Vector store over a locked `Vec`, exact cosine search
#[derive(Default)]
pub struct MemoryVectorStore {
    rows: Mutex<Vec<DocumentRow>>,
    search_calls: AtomicUsize,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn search_calls(&self) -> &AtomicUsize {
        &self.search_calls
    }
}

#[async_trait]
impl VectorStoreProvider for MemoryVectorStore {
    async fn insert_rows(&self, rows: &[DocumentRow]) -> Result<usize> {
        self.rows.lock().extend_from_slice(rows);
        Ok(rows.len())
    }

    async fn contains_hash(&self, content_hash: &str) -> Result<bool> {
        Ok(self
            .rows
            .lock()
            .iter()
            .any(|row| row.content_hash == content_hash))
    }

    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let rows = self.rows.lock();
        let mut scored: Vec<(f32, &DocumentRow)> = rows
            .iter()
            .map(|row| (cosine_similarity(query.as_slice(), row.embedding.as_slice()), row))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(i, (similarity, row))| RetrievedChunk {
                content: row.content.clone(),
                rank: i + 1,
                similarity,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.row_count())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Generation stub with a canned reply
pub struct FakeLlm {
    reply: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<ChatPrompt>>,
}

impl FakeLlm {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Every completion fails with an upstream error
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> &AtomicUsize {
        &self.calls
    }

    pub fn last_prompt(&self) -> Option<ChatPrompt> {
        self.last_prompt.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock() = Some(prompt.clone());
        self.reply
            .clone()
            .ok_or_else(|| Error::llm("500 upstream unavailable"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.reply.is_some())
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-chat"
    }
}
