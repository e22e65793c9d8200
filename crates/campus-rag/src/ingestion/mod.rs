//! Document ingestion: text extraction, word-window chunking and the
//! embed-and-store pipeline

mod chunker;
mod parser;
mod pipeline;

pub use chunker::{normalize_whitespace, WordChunker};
pub use parser::FileParser;
pub use pipeline::{IngestOptions, IngestPipeline};

/// Windows with fewer words than this are discarded as noise
pub const NOISE_FLOOR_WORDS: usize = 5;
