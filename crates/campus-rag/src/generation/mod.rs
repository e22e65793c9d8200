//! Prompt assembly for answer generation

pub mod prompt;

pub use prompt::{PromptBuilder, FALLBACK_ANSWER, OPEN_DOMAIN_FALLBACK};
