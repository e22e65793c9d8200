//! Document, chunk and stored-row types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::embeddings::Embedding;

/// File types accepted for ingestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Anything else, keeps the extension for error messages
    Unknown(String),
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Detect file type from a filename; names without an extension are unknown
    pub fn from_filename(filename: &str) -> Self {
        match std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
        {
            Some(ext) => Self::from_extension(ext),
            None => Self::Unknown(String::new()),
        }
    }

    /// Check if this file type can be ingested
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Get display name for the file type
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text",
            Self::Unknown(ext) if ext.is_empty() => "(no extension)",
            Self::Unknown(ext) => ext,
        }
    }
}

/// Input to the ingestion pipeline
#[derive(Debug, Clone)]
pub enum IngestSource {
    /// An uploaded or on-disk file
    File { filename: String, data: Bytes },
    /// Text pasted by the caller
    Text(String),
}

impl IngestSource {
    /// Build a file source
    pub fn file(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::File {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Build a raw text source
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Name used in logs
    pub fn label(&self) -> &str {
        match self {
            Self::File { filename, .. } => filename,
            Self::Text(_) => "<pasted text>",
        }
    }

    /// Size of the raw input in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::File { data, .. } => data.len(),
            Self::Text(text) => text.len(),
        }
    }
}

/// A contiguous word window of normalised document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Ordinal position within the source document (0-indexed)
    pub index: usize,
    /// Space-joined words
    pub content: String,
    /// Number of words in `content`
    pub word_count: usize,
}

impl Chunk {
    /// Create a chunk from its words
    pub fn from_words(index: usize, words: &[&str]) -> Self {
        Self {
            index,
            content: words.join(" "),
            word_count: words.len(),
        }
    }

    /// SHA-256 hex digest of the content
    pub fn content_hash(&self) -> String {
        content_hash(&self.content)
    }
}

/// Compute a hex SHA-256 hash for dedup keying
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// A persisted `(content, embedding)` row
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub content: String,
    pub content_hash: String,
    pub embedding: Embedding,
}

impl DocumentRow {
    /// Build a row for a chunk and its embedding
    pub fn new(content: impl Into<String>, embedding: Embedding) -> Self {
        let content = content.into();
        Self {
            content_hash: content_hash(&content),
            content,
            embedding,
        }
    }
}

/// A chunk returned by similarity search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// Stored chunk text
    pub content: String,
    /// 1-based rank, best match first
    pub rank: usize,
    /// Cosine similarity to the query
    pub similarity: f32,
}
