//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::error::Result;

/// A fully assembled chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    /// System instruction
    pub system: String,
    /// User turn: context, memory, language directive and question
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
}

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `OpenRouterClient`: OpenAI-compatible chat completions (deepseek-chat by default)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion and return the assistant text
    ///
    /// A successful call may return blank text; callers decide what that means.
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;

    /// Check if the provider is configured and reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
