//! Request types for the HTTP surface

use serde::{Deserialize, Serialize};

/// Question submitted to the answer pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The question to answer
    pub question: String,

    /// Existing conversation to continue (a new one is created when absent)
    #[serde(default)]
    pub conversation_id: Option<String>,

    /// Whether the question came from speech input
    #[serde(default)]
    pub is_voice: bool,

    /// BCP-47 tag of the speech recogniser, e.g. `hi-IN`
    #[serde(default)]
    pub voice_language: Option<String>,
}

impl ChatRequest {
    /// Create a new text question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Continue an existing conversation
    pub fn in_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Mark as a voice question recognised in `language`
    pub fn with_voice(mut self, language: impl Into<String>) -> Self {
        self.is_voice = true;
        self.voice_language = Some(language.into());
        self
    }
}

/// Embedding passthrough request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
}

/// Speech synthesis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub model: String,
}
