//! Response types for ingestion and answers

use serde::{Deserialize, Serialize};

use crate::retrieval::Language;

/// One chunk that failed during ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    /// 0-indexed chunk position within the document
    pub chunk: usize,
    /// Human-readable failure
    pub message: String,
}

/// Outcome of ingesting one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks embedded and written
    pub chunks_inserted: usize,
    /// Chunks already stored under the same content hash
    pub chunks_duplicate: usize,
    /// Chunks produced by the chunker
    pub total_chunks: usize,
    /// Per-chunk failures, ordered by chunk index
    pub errors: Vec<ChunkFailure>,
}

impl IngestReport {
    /// Chunks that are now present in the store
    pub fn chunks_stored(&self) -> usize {
        self.chunks_inserted + self.chunks_duplicate
    }
}

/// Response from the ingestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub chunks_inserted: usize,
    pub total_chunks: usize,
    pub chunks_duplicate: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ChunkFailure>>,
    pub processing_time_ms: u64,
}

impl IngestResponse {
    /// Build the response body for a successful ingestion
    pub fn from_report(report: IngestReport, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            chunks_inserted: report.chunks_inserted,
            total_chunks: report.total_chunks,
            chunks_duplicate: report.chunks_duplicate,
            errors: if report.errors.is_empty() {
                None
            } else {
                Some(report.errors)
            },
            processing_time_ms,
        }
    }
}

/// How a question was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Answer restricted to retrieved university records
    Grounded,
    /// General assistant answer, no retrieval
    OpenDomain,
}

impl AnswerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grounded => "grounded",
            Self::OpenDomain => "open_domain",
        }
    }
}

/// Result of the answer pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Final answer text, never blank
    pub answer: String,
    /// Conversation the turns were appended to
    pub conversation_id: String,
    /// Routing decision
    pub mode: AnswerMode,
    /// Retrieved chunk contents in rank order (empty for open-domain)
    pub sources: Vec<String>,
    /// Language the answer was requested in
    pub language: Language,
}

/// Response from the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    pub conversation_id: String,
    pub mode: AnswerMode,
    pub sources: Vec<String>,
    pub language: Language,
    pub processing_time_ms: u64,
}

impl ChatResponse {
    pub fn from_answer(answer: Answer, processing_time_ms: u64) -> Self {
        Self {
            answer: answer.answer,
            conversation_id: answer.conversation_id,
            mode: answer.mode,
            sources: answer.sources,
            language: answer.language,
            processing_time_ms,
        }
    }
}

/// Response from the embedding passthrough endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
}
