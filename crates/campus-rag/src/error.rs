//! Error types for the RAG service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::response::ChunkFailure;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing, malformed or oversized request input
    #[error("{0}")]
    InvalidInput(String),

    /// Unsupported file type
    #[error("Unsupported file type: {0}. Upload a .pdf or .txt file.")]
    UnsupportedFileType(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Extraction produced no text at all
    #[error("No readable text found in the input.")]
    NoReadableText,

    /// Chunking produced nothing above the noise floor
    #[error("Text produced zero usable chunks.")]
    NoUsableChunks,

    /// Missing or unknown credential
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed to perform the action
    #[error("Forbidden")]
    Forbidden,

    /// Embedding service failure
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Embedding service answered with the wrong shape
    #[error("Unexpected embedding shape: {0}")]
    EmbeddingShape(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    VectorDb(String),

    /// Generation service error
    #[error("Chat API failed: {0}")]
    Llm(String),

    /// Speech synthesis error
    #[error("TTS generation failed: {0}")]
    Speech(String),

    /// Conversation does not exist or belongs to another user
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Conversation store error
    #[error("Conversation store error: {0}")]
    ConversationStore(String),

    /// Every chunk of a document failed to embed or store
    #[error("All chunks failed to embed/insert.")]
    IngestionFailed {
        total_chunks: usize,
        errors: Vec<ChunkFailure>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector store error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable snake_case discriminator used in error bodies and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::UnsupportedFileType(_) => "unsupported_type",
            Error::FileParse { .. } => "parse_error",
            Error::NoReadableText => "no_readable_text",
            Error::NoUsableChunks => "no_usable_chunks",
            Error::Unauthorized => "unauthorized",
            Error::Forbidden => "forbidden",
            Error::Embedding(_) => "embedding_error",
            Error::EmbeddingShape(_) => "embedding_shape_error",
            Error::VectorDb(_) => "vector_db_error",
            Error::Llm(_) => "llm_error",
            Error::Speech(_) => "speech_error",
            Error::ConversationNotFound(_) => "not_found",
            Error::ConversationStore(_) => "conversation_store_error",
            Error::IngestionFailed { .. } => "ingestion_failed",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to at the request boundary
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_)
            | Error::UnsupportedFileType(_)
            | Error::FileParse { .. }
            | Error::NoReadableText
            | Error::NoUsableChunks
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            Error::Embedding(_)
            | Error::EmbeddingShape(_)
            | Error::Llm(_)
            | Error::Speech(_)
            | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_)
            | Error::VectorDb(_)
            | Error::ConversationStore(_)
            | Error::IngestionFailed { .. }
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for errors the caller can fix by changing the request
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::VectorDb(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        } else {
            tracing::debug!(kind = self.kind(), "Request rejected: {}", self);
        }

        let body = match &self {
            Error::IngestionFailed { errors, total_chunks } => json!({
                "error": self.to_string(),
                "kind": self.kind(),
                "totalChunks": total_chunks,
                "details": errors,
            }),
            _ => json!({
                "error": self.to_string(),
                "kind": self.kind(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
