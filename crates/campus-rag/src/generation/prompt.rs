//! Prompt templates for grounded and open-domain answers

use crate::config::LlmConfig;
use crate::providers::llm::ChatPrompt;
use crate::retrieval::Language;
use crate::types::RetrievedChunk;

/// Answer mandated when the records do not cover a question
pub const FALLBACK_ANSWER: &str = "Information not available in university records.";

/// Substituted for a blank open-domain completion
pub const OPEN_DOMAIN_FALLBACK: &str =
    "I could not generate a response right now. Please try again.";

/// Prompt builder for both answer modes
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    assistant_name: String,
    temperature: f32,
}

impl PromptBuilder {
    pub fn new(assistant_name: impl Into<String>, temperature: f32) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            temperature,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.assistant_name.clone(), config.temperature)
    }

    /// Number retrieved chunks in rank order: `[1] ...\n\n[2] ...`
    pub fn build_context(chunks: &[RetrievedChunk]) -> String {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| format!("[{}] {}", i + 1, chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// System instruction that confines the answer to the supplied context
    pub fn grounded_system(&self) -> String {
        format!(
            "You are {name}. Answer strictly using the provided context. \
             If the answer is not found in the context, respond: '{fallback}' \
             Do not guess. Do not add assumptions. \
             Use the conversation history only to understand follow-up questions, \
             never as a source of facts.",
            name = self.assistant_name,
            fallback = FALLBACK_ANSWER,
        )
    }

    /// System instruction for general questions
    pub fn open_domain_system(&self) -> String {
        format!(
            "You are {name}, a helpful assistant for students and staff. \
             Answer general questions clearly and concisely. \
             If you are not sure of something, say so instead of inventing details.",
            name = self.assistant_name,
        )
    }

    /// Grounded prompt: context, memory, language directive, then the question
    pub fn grounded(
        &self,
        question: &str,
        context: &str,
        memory: &str,
        language: Language,
    ) -> ChatPrompt {
        let mut user = format!("Context:\n{}\n\n", context);
        push_memory_and_directive(&mut user, memory, language);
        user.push_str(&format!("Question: {}", question));

        ChatPrompt {
            system: self.grounded_system(),
            user,
            temperature: self.temperature,
        }
    }

    /// Open-domain prompt: memory, language directive, then the question
    pub fn open_domain(&self, question: &str, memory: &str, language: Language) -> ChatPrompt {
        let mut user = String::new();
        push_memory_and_directive(&mut user, memory, language);
        user.push_str(&format!("Question: {}", question));

        ChatPrompt {
            system: self.open_domain_system(),
            user,
            temperature: self.temperature,
        }
    }
}

fn push_memory_and_directive(user: &mut String, memory: &str, language: Language) {
    user.push_str(&format!("Conversation history:\n{}\n\n", memory));
    if let Some(directive) = language.directive() {
        user.push_str(directive);
        user.push_str("\n\n");
    }
}
