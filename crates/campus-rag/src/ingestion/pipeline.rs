//! Document ingestion: extract, chunk, embed, store

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use super::chunker::{normalize_whitespace, WordChunker};
use super::parser::FileParser;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{Chunk, ChunkFailure, DocumentRow, FileType, IngestReport, IngestSource};

/// Tunables for [`IngestPipeline`]
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Skip chunks whose content hash is already stored
    pub deduplicate: bool,
    /// Chunks in flight at once (1 = strictly sequential)
    pub concurrency: usize,
    /// Upper bound for PDF text extraction
    pub extraction_timeout: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            deduplicate: true,
            concurrency: 1,
            extraction_timeout: Duration::from_secs(60),
        }
    }
}

enum ChunkOutcome {
    Inserted,
    Duplicate,
    Failed(ChunkFailure),
}

/// Ingestion pipeline shared by the upload route and the batch CLI
pub struct IngestPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    chunker: WordChunker,
    options: IngestOptions,
}

impl IngestPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        chunker: WordChunker,
        options: IngestOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            chunker,
            options,
        }
    }

    /// Build a pipeline with chunking and store options taken from `config`
    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        let options = IngestOptions {
            deduplicate: config.vector_store.deduplicate,
            concurrency: config.vector_store.ingest_concurrency.max(1),
            extraction_timeout: Duration::from_secs(config.vector_store.extraction_timeout_secs),
        };
        Self::new(
            embedder,
            store,
            WordChunker::new(config.chunking.max_words, config.chunking.min_words),
            options,
        )
    }

    /// Ingest one document
    ///
    /// Input problems (unsupported type, no text, no usable chunks) fail before
    /// any embedding call. Per-chunk failures are recorded and do not stop the
    /// remaining chunks; the call only fails as a whole when every chunk failed.
    pub async fn ingest(&self, source: IngestSource) -> Result<IngestReport> {
        let label = source.label().to_string();
        tracing::info!("Ingesting {} ({} bytes)", label, source.size());

        let text = self.extract(source).await?;
        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(Error::NoReadableText);
        }

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err(Error::NoUsableChunks);
        }

        let total_chunks = chunks.len();
        tracing::debug!("{} produced {} chunks", label, total_chunks);

        let mut outcomes: Vec<(usize, ChunkOutcome)> = stream::iter(chunks)
            .map(|chunk| async move {
                let index = chunk.index;
                (index, self.process_chunk(chunk).await)
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut report = IngestReport {
            total_chunks,
            ..Default::default()
        };
        for (_, outcome) in outcomes {
            match outcome {
                ChunkOutcome::Inserted => report.chunks_inserted += 1,
                ChunkOutcome::Duplicate => report.chunks_duplicate += 1,
                ChunkOutcome::Failed(failure) => report.errors.push(failure),
            }
        }

        if report.chunks_stored() == 0 {
            tracing::error!("All {} chunks of {} failed", total_chunks, label);
            return Err(Error::IngestionFailed {
                total_chunks,
                errors: report.errors,
            });
        }

        tracing::info!(
            "Ingested {}: {} inserted, {} duplicate, {} failed of {} chunks",
            label,
            report.chunks_inserted,
            report.chunks_duplicate,
            report.errors.len(),
            total_chunks
        );
        Ok(report)
    }

    /// Turn a source into raw text
    pub async fn extract(&self, source: IngestSource) -> Result<String> {
        let (filename, data) = match source {
            IngestSource::Text(text) => return Ok(text),
            IngestSource::File { filename, data } => (filename, data),
        };

        let file_type = FileType::from_filename(&filename);
        if !file_type.is_supported() {
            return Err(Error::UnsupportedFileType(file_type.display_name().to_string()));
        }
        if file_type == FileType::Txt {
            return FileParser::extract(&filename, &data);
        }

        let timeout = self.options.extraction_timeout;
        let name = filename.clone();
        let task = tokio::task::spawn_blocking(move || FileParser::extract(&name, &data));

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(Error::internal(format!("extraction task failed: {}", e))),
            Err(_) => Err(Error::file_parse(
                filename,
                format!("text extraction timed out after {}s", timeout.as_secs()),
            )),
        }
    }

    async fn process_chunk(&self, chunk: Chunk) -> ChunkOutcome {
        let index = chunk.index;
        match self.store_chunk(chunk).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Chunk {} failed: {}", index, e);
                ChunkOutcome::Failed(ChunkFailure {
                    chunk: index,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn store_chunk(&self, chunk: Chunk) -> Result<ChunkOutcome> {
        if self.options.deduplicate && self.store.contains_hash(&chunk.content_hash()).await? {
            tracing::debug!("Chunk {} already stored, skipping", chunk.index);
            return Ok(ChunkOutcome::Duplicate);
        }

        let embedding = self.embedder.embed(&chunk.content).await?;
        let inserted = self
            .store
            .insert_rows(&[DocumentRow::new(chunk.content, embedding)])
            .await?;
        tracing::debug!("Chunk {} stored", chunk.index);

        Ok(if inserted == 0 {
            ChunkOutcome::Duplicate
        } else {
            ChunkOutcome::Inserted
        })
    }
}
