//! Retrieval and answer pipeline

use std::sync::Arc;

use super::language::Language;
use super::memory::format_transcript;
use super::router::TopicRouter;
use crate::config::{RagConfig, RetrievalConfig};
use crate::error::{Error, Result};
use crate::generation::{PromptBuilder, FALLBACK_ANSWER, OPEN_DOMAIN_FALLBACK};
use crate::providers::{ConversationStore, EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::types::conversation::conversation_title;
use crate::types::{Answer, AnswerMode, ChatRequest, Role};

/// Tunables for [`AnswerPipeline`]
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    pub top_k: usize,
    pub memory_turns: usize,
    pub max_question_chars: usize,
    pub hinglish_min_hits: usize,
}

impl From<&RetrievalConfig> for AnswerOptions {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            memory_turns: config.memory_turns,
            max_question_chars: config.max_question_chars,
            hinglish_min_hits: config.hinglish_min_hits,
        }
    }
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

/// Answers questions, grounded in stored chunks when the topic calls for it
pub struct AnswerPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    conversations: Arc<dyn ConversationStore>,
    router: TopicRouter,
    prompts: PromptBuilder,
    options: AnswerOptions,
}

impl AnswerPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            conversations,
            router: TopicRouter::default(),
            prompts: PromptBuilder::new("Amity University AI Assistant", 0.0),
            options: AnswerOptions::default(),
        }
    }

    /// Build a pipeline with routing, prompt and retrieval settings from `config`
    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        Self::new(embedder, store, llm, conversations)
            .with_router(TopicRouter::new(&config.retrieval.keywords))
            .with_prompts(PromptBuilder::from_config(&config.llm))
            .with_options(AnswerOptions::from(&config.retrieval))
    }

    pub fn with_router(mut self, router: TopicRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_options(mut self, options: AnswerOptions) -> Self {
        self.options = options;
        self
    }

    /// Answer `request` on behalf of `user_id`
    ///
    /// The question and the answer are appended to the conversation only after
    /// generation succeeded; a new conversation is created at that point when
    /// the request did not name one.
    pub async fn answer(&self, user_id: &str, request: &ChatRequest) -> Result<Answer> {
        let question = self.validate_question(&request.question)?;

        let existing = request
            .conversation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let history = match existing {
            Some(id) => {
                self.conversations.touch_conversation(user_id, id).await?;
                self.conversations
                    .recent_messages(id, self.options.memory_turns)
                    .await?
            }
            None => Vec::new(),
        };
        let memory = format_transcript(&history);

        let language = Language::resolve(
            question,
            request.is_voice,
            request.voice_language.as_deref(),
            self.options.hinglish_min_hits,
        );
        let mode = self.router.route(question);
        tracing::info!(
            mode = mode.as_str(),
            language = language.as_str(),
            history = history.len(),
            "Answering question"
        );

        let (answer, sources) = match mode {
            AnswerMode::Grounded => self.grounded(question, &memory, language).await?,
            AnswerMode::OpenDomain => (self.open_domain(question, &memory, language).await?, Vec::new()),
        };

        let conversation_id = match existing {
            Some(id) => id.to_string(),
            None => {
                self.conversations
                    .create_conversation(user_id, &conversation_title(question))
                    .await?
                    .id
            }
        };
        self.conversations
            .append_message(&conversation_id, Role::User, question)
            .await?;
        self.conversations
            .append_message(&conversation_id, Role::Assistant, &answer)
            .await?;

        Ok(Answer {
            answer,
            conversation_id,
            mode,
            sources,
            language,
        })
    }

    fn validate_question<'a>(&self, question: &'a str) -> Result<&'a str> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::invalid_input("question is required"));
        }
        if question.chars().count() > self.options.max_question_chars {
            return Err(Error::invalid_input(format!(
                "question exceeds {} characters",
                self.options.max_question_chars
            )));
        }
        Ok(question)
    }

    async fn grounded(
        &self,
        question: &str,
        memory: &str,
        language: Language,
    ) -> Result<(String, Vec<String>)> {
        let embedding = self.embedder.embed(question).await?;
        let chunks = self.store.search(&embedding, self.options.top_k).await?;

        if chunks.is_empty() {
            tracing::info!("No chunks retrieved, returning fallback answer");
            return Ok((FALLBACK_ANSWER.to_string(), Vec::new()));
        }
        tracing::debug!("Retrieved {} chunks", chunks.len());

        let context = PromptBuilder::build_context(&chunks);
        let prompt = self.prompts.grounded(question, &context, memory, language);
        let completion = self.llm.complete(&prompt).await?;

        let answer = if completion.trim().is_empty() {
            tracing::warn!("{} returned a blank completion", self.llm.name());
            FALLBACK_ANSWER.to_string()
        } else {
            completion.trim().to_string()
        };

        Ok((answer, chunks.into_iter().map(|c| c.content).collect()))
    }

    async fn open_domain(&self, question: &str, memory: &str, language: Language) -> Result<String> {
        let prompt = self.prompts.open_domain(question, memory, language);
        let completion = self.llm.complete(&prompt).await?;

        if completion.trim().is_empty() {
            tracing::warn!("{} returned a blank completion", self.llm.name());
            return Ok(OPEN_DOMAIN_FALLBACK.to_string());
        }
        Ok(completion.trim().to_string())
    }
}
