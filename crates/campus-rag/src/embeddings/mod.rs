//! Embedding vectors: shape validation, normalisation of provider responses,
//! vector literals and similarity.

mod normalize;
mod vector;

pub use normalize::{flatten_embedding, MAX_UNWRAP_DEPTH};
pub use vector::{cosine_similarity, parse_vector_literal, to_vector_literal, Embedding};

/// Dimension of the reference model (all-MiniLM-L6-v2)
pub const DEFAULT_DIMENSIONS: usize = 384;
