//! Word-window chunking of normalised text

use crate::types::Chunk;

use super::NOISE_FLOOR_WORDS;

/// Collapse every whitespace run to a single space and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits text into non-overlapping windows of at most `max_words` words
///
/// Windows advance by their own length. Any window shorter than
/// `max(min_words, NOISE_FLOOR_WORDS)` is dropped; since every window but the
/// last is full, only a short trailing remainder can be lost.
#[derive(Debug, Clone, Copy)]
pub struct WordChunker {
    max_words: usize,
    min_words: usize,
}

impl WordChunker {
    /// Create a chunker; `max_words` is raised to the noise floor if smaller
    pub fn new(max_words: usize, min_words: usize) -> Self {
        Self {
            max_words: max_words.max(NOISE_FLOOR_WORDS),
            min_words,
        }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Smallest window that is kept
    pub fn floor(&self) -> usize {
        self.min_words.max(NOISE_FLOOR_WORDS)
    }

    /// Chunk `text` in document order
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let floor = self.floor();

        words
            .chunks(self.max_words)
            .filter(|window| window.len() >= floor)
            .enumerate()
            .map(|(index, window)| Chunk::from_words(index, window))
            .collect()
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new(600, 0)
    }
}
