//! Configuration for the RAG service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embeddings::DEFAULT_DIMENSIONS;
use crate::error::{Error, Result};
use crate::ingestion::NOISE_FLOOR_WORDS;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "CAMPUS_RAG_CONFIG";

/// Main RAG service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Caller credentials
    pub auth: AuthConfig,
    /// Embedding service configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Generation service configuration
    pub llm: LlmConfig,
    /// Retrieval and answer configuration
    pub retrieval: RetrievalConfig,
    /// Vector store configuration
    pub vector_store: VectorStoreConfig,
    /// Conversation store configuration
    pub conversations: ConversationConfig,
    /// Speech synthesis configuration
    pub speech: SpeechConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Load from `CAMPUS_RAG_CONFIG` (or defaults), apply environment overrides and validate
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Pull secrets and deployment knobs from the environment
    pub fn apply_env_overrides(&mut self) {
        let hf_key = env_non_empty("HUGGINGFACE_API_KEY").or_else(|| env_non_empty("HF_API_KEY"));
        if let Some(key) = hf_key {
            self.embeddings.api_key = Some(key.clone());
            self.speech.api_key = Some(key);
        }
        if let Some(key) = env_non_empty("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(host) = env_non_empty("CAMPUS_RAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_non_empty("CAMPUS_RAG_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = env_non_empty("POSTGREST_URL") {
            self.vector_store.postgrest_url = Some(url);
        }
        if let Some(key) = env_non_empty("POSTGREST_SERVICE_KEY") {
            self.vector_store.postgrest_key = Some(key);
        }
    }

    /// Reject configurations the pipelines cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".into()));
        }
        if self.chunking.max_words < NOISE_FLOOR_WORDS {
            return Err(Error::Config(format!(
                "chunking.max_words must be at least {}",
                NOISE_FLOOR_WORDS
            )));
        }
        if self.chunking.min_words > self.chunking.max_words {
            return Err(Error::Config(
                "chunking.min_words cannot exceed chunking.max_words".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".into()));
        }
        if self.retrieval.memory_turns == 0 {
            return Err(Error::Config("retrieval.memory_turns must be positive".into()));
        }
        if self.vector_store.ingest_concurrency == 0 {
            return Err(Error::Config(
                "vector_store.ingest_concurrency must be positive".into(),
            ));
        }
        if self.vector_store.backend == VectorBackend::Postgrest
            && self.vector_store.postgrest_url.is_none()
        {
            return Err(Error::Config(
                "postgrest backend selected but vector_store.postgrest_url is missing".into(),
            ));
        }
        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 10MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

/// A bearer token and the identity it resolves to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub uid: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "Student".to_string()
}

/// Caller credentials known to the static authorizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<TokenEntry>,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name (default: all-MiniLM-L6-v2)
    pub model: String,
    /// Feature-extraction endpoint; `{model}` is substituted
    pub endpoint: String,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// API key (usually from HUGGINGFACE_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            endpoint: "https://router.huggingface.co/hf-inference/models/{model}".to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Word-window chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum words per chunk
    pub max_words: usize,
    /// Minimum words per chunk; the 5-word noise floor applies regardless
    pub min_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_words: 600,
            min_words: 0,
        }
    }
}

/// Generation (chat completion) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat completions endpoint
    pub endpoint: String,
    /// Generation model name
    pub model: String,
    /// API key (usually from OPENROUTER_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Assistant name used in system instructions
    pub assistant_name: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "deepseek/deepseek-chat".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 60,
            assistant_name: "Amity University AI Assistant".to_string(),
        }
    }
}

/// Retrieval, routing and memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per grounded question
    pub top_k: usize,
    /// Conversation turns injected as memory
    pub memory_turns: usize,
    /// Longest accepted question, in characters
    pub max_question_chars: usize,
    /// Keyword allowlist for grounded routing (empty = built-in list)
    pub keywords: Vec<String>,
    /// Romanised Hindi hits needed to answer in Hinglish
    pub hinglish_min_hits: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            memory_turns: 8,
            max_question_chars: 2000,
            keywords: Vec::new(),
            hinglish_min_hits: 2,
        }
    }
}

/// Vector store backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Local SQLite file with exact cosine search
    #[default]
    Sqlite,
    /// PostgREST in front of pgvector (`documents` table + `match_documents` rpc)
    Postgrest,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Backend provider
    pub backend: VectorBackend,
    /// SQLite database path (sqlite backend)
    pub storage_path: PathBuf,
    /// PostgREST base URL (postgrest backend)
    pub postgrest_url: Option<String>,
    /// PostgREST service key (postgrest backend)
    #[serde(skip_serializing)]
    pub postgrest_key: Option<String>,
    /// Look up each chunk's content hash before embedding it
    ///
    /// The SQLite store refuses duplicate content either way.
    pub deduplicate: bool,
    /// Chunks embedded concurrently during ingestion (1 = sequential)
    pub ingest_concurrency: usize,
    /// PDF extraction timeout in seconds
    pub extraction_timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Sqlite,
            storage_path: default_data_dir().join("documents.db"),
            postgrest_url: None,
            postgrest_key: None,
            deduplicate: true,
            ingest_concurrency: 1,
            extraction_timeout_secs: 60,
        }
    }
}

/// Conversation store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// SQLite database path
    pub storage_path: PathBuf,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            storage_path: default_data_dir().join("conversations.db"),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Inference API base URL; the model name is appended
    pub endpoint: String,
    /// Models callers may request
    pub allowed_models: Vec<String>,
    /// API key (usually from HUGGINGFACE_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Longest text synthesised, in characters
    pub max_chars: usize,
    /// Attempts while the model is loading
    pub max_attempts: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            allowed_models: vec![
                "facebook/mms-tts-hin".to_string(),
                "facebook/mms-tts-eng".to_string(),
            ],
            api_key: None,
            max_chars: 400,
            max_attempts: 3,
            timeout_secs: 30,
        }
    }
}

fn default_data_dir() -> PathBuf {
    // Absolute path so the service does not depend on its working directory
    dirs::data_local_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
        .join("campus-rag")
}
