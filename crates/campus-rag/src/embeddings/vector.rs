//! Fixed-dimension embedding vector

use crate::error::{Error, Result};

/// A dense vector whose length was checked against the model dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Validate `values` against `dimensions`; every component must be finite
    pub fn new(values: Vec<f32>, dimensions: usize) -> Result<Self> {
        if values.len() != dimensions {
            return Err(Error::EmbeddingShape(format!(
                "expected {}, got {}",
                dimensions,
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::EmbeddingShape(format!(
                "component {} is not a finite number",
                pos
            )));
        }
        Ok(Self(values))
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Bracketed literal understood by the vector store query primitive
    pub fn to_literal(&self) -> String {
        to_vector_literal(&self.0)
    }

    /// Little-endian f32 bytes for BLOB storage
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() * 4);
        for v in &self.0 {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    /// Decode little-endian f32 bytes written by [`Embedding::to_le_bytes`]
    pub fn from_le_bytes(bytes: &[u8], dimensions: usize) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(Error::vector_db(format!(
                "embedding blob of {} bytes is not a whole number of f32s",
                bytes.len()
            )));
        }
        let values = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::new(values, dimensions)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Format a vector as `[v1,v2,...]`; an empty vector gives `[]`
pub fn to_vector_literal(vector: &[f32]) -> String {
    let mut literal = String::with_capacity(vector.len() * 12 + 2);
    literal.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        literal.push_str(&v.to_string());
    }
    literal.push(']');
    literal
}

/// Parse a `[v1,v2,...]` literal back into components
pub fn parse_vector_literal(literal: &str) -> Result<Vec<f32>> {
    let inner = literal
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| Error::vector_db("vector literal must be enclosed in brackets"))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| Error::vector_db(format!("bad vector component '{}': {}", part, e)))
        })
        .collect()
}

/// Cosine similarity in [-1, 1]; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
