//! Core types for the RAG service

pub mod conversation;
pub mod document;
pub mod query;
pub mod response;

pub use conversation::{Conversation, Message, Role};
pub use document::{content_hash, Chunk, DocumentRow, FileType, IngestSource, RetrievedChunk};
pub use query::{ChatRequest, EmbedRequest, SpeechRequest};
pub use response::{
    Answer, AnswerMode, ChatResponse, ChunkFailure, EmbedResponse, IngestReport, IngestResponse,
};
