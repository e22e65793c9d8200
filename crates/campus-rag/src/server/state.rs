//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::IngestPipeline;
use crate::providers::{
    vector_store_from_config, Authorizer, ConversationStore, EmbeddingProvider,
    HuggingFaceEmbedder, LlmProvider, OpenRouterClient, SpeechProvider, SpeechSynthesizer,
    SqliteConversationStore, StaticTokenAuthorizer, VectorStoreProvider,
};
use crate::retrieval::AnswerPipeline;

/// The collaborators a server is assembled from
///
/// `AppState::new` builds the real ones from config; tests hand in fakes.
#[derive(Clone)]
pub struct Providers {
    pub authorizer: Arc<dyn Authorizer>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: Arc<dyn VectorStoreProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub conversations: Arc<dyn ConversationStore>,
    pub speech: Arc<dyn SpeechProvider>,
}

impl Providers {
    /// Build every provider named by `config`
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(HuggingFaceEmbedder::new(&config.embeddings)?);
        tracing::info!(
            "Embedding provider: {} ({}, {} dims)",
            embedder.name(),
            config.embeddings.model,
            config.embeddings.dimensions
        );

        let store = vector_store_from_config(config)?;

        let llm: Arc<dyn LlmProvider> = Arc::new(OpenRouterClient::new(&config.llm)?);
        tracing::info!("Generation provider: {} ({})", llm.name(), llm.model());

        let conversations: Arc<dyn ConversationStore> = Arc::new(SqliteConversationStore::open(
            &config.conversations.storage_path,
        )?);

        let authorizer = StaticTokenAuthorizer::from_config(&config.auth);
        if authorizer.is_empty() {
            tracing::warn!("No auth tokens configured; every request will be rejected");
        }

        Ok(Self {
            authorizer: Arc::new(authorizer),
            embedder,
            store,
            llm,
            conversations,
            speech: Arc::new(SpeechSynthesizer::new(&config.speech)?),
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    providers: Providers,
    ingest: IngestPipeline,
    answers: AnswerPipeline,
}

impl AppState {
    /// Create application state from configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing RAG application state (vector backend: {:?})...",
            config.vector_store.backend
        );
        let providers = Providers::from_config(&config)?;
        Ok(Self::with_providers(config, providers))
    }

    /// Wire the pipelines around already-built providers
    pub fn with_providers(config: RagConfig, providers: Providers) -> Self {
        let ingest = IngestPipeline::from_config(
            &config,
            providers.embedder.clone(),
            providers.store.clone(),
        );
        let answers = AnswerPipeline::from_config(
            &config,
            providers.embedder.clone(),
            providers.store.clone(),
            providers.llm.clone(),
            providers.conversations.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                providers,
                ingest,
                answers,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn authorizer(&self) -> &Arc<dyn Authorizer> {
        &self.inner.providers.authorizer
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.providers.embedder
    }

    pub fn vector_store_provider(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.providers.store
    }

    pub fn speech_provider(&self) -> &Arc<dyn SpeechProvider> {
        &self.inner.providers.speech
    }

    pub fn ingest_pipeline(&self) -> &IngestPipeline {
        &self.inner.ingest
    }

    pub fn answer_pipeline(&self) -> &AnswerPipeline {
        &self.inner.answers
    }

    /// Ready when the embedder and the vector store both report healthy
    pub async fn is_ready(&self) -> bool {
        let embedder = self.embedding_provider().health_check().await;
        let store = self.vector_store_provider().health_check().await;
        match (embedder, store) {
            (Ok(true), Ok(true)) => true,
            (embedder, store) => {
                tracing::warn!(?embedder, ?store, "Readiness check failed");
                false
            }
        }
    }
}
