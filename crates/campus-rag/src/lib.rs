//! campus-rag: retrieval-augmented question answering over university records
//!
//! Documents (.pdf, .txt or pasted text) are split into word windows, embedded
//! and stored in a vector store. Questions about the university are answered
//! strictly from the retrieved chunks; anything else goes to a general
//! assistant prompt. Conversations keep a short memory of earlier turns.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{IngestOptions, IngestPipeline, WordChunker};
pub use retrieval::{AnswerPipeline, Language};
pub use server::{build_router, state::AppState, RagServer};
pub use types::{
    document::{Chunk, DocumentRow, FileType, IngestSource, RetrievedChunk},
    query::ChatRequest,
    response::{Answer, AnswerMode, ChatResponse, IngestReport, IngestResponse},
};
