//! Hugging Face feature-extraction embedder
//!
//! Posts `{ "inputs": text }` to the inference endpoint and normalises the
//! response with [`flatten_embedding`].

use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::embeddings::{flatten_embedding, Embedding};
use crate::error::{Error, Result};
use crate::providers::embedding::EmbeddingProvider;

/// Hugging Face inference embedding provider
pub struct HuggingFaceEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
}

impl HuggingFaceEmbedder {
    /// Create a new embedder from config
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build embedding HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.replace("{model}", &config.model),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            dimensions: config.dimensions,
        })
    }

    /// Resolved feature-extraction URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(serde::Serialize)]
struct FeatureRequest<'a> {
    inputs: &'a str,
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&FeatureRequest { inputs: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Embedding(format!("request to {} timed out", self.model))
            } else {
                Error::Embedding(format!("request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Hugging Face embedding failed ({}): {}",
                status, body
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        flatten_embedding(&value, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        // No cheap probe endpoint; a configured key is the best local signal
        Ok(self.api_key.is_some())
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_endpoint_substitutes_model() {
        let embedder = HuggingFaceEmbedder::new(&EmbeddingConfig::default()).unwrap();
        assert_eq!(
            embedder.endpoint(),
            "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2"
        );
        assert_eq!(embedder.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_health_requires_key() {
        let mut config = EmbeddingConfig::default();
        assert!(!HuggingFaceEmbedder::new(&config).unwrap().health_check().await.unwrap());
        config.api_key = Some("hf_test".into());
        assert!(HuggingFaceEmbedder::new(&config).unwrap().health_check().await.unwrap());
    }

    /// Feature-extraction server with one route per behaviour
    async fn spawn_inference() -> String {
        let app = Router::new()
            .route(
                "/models/nested",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["inputs"], "library hours");
                    Json(json!([[[0.1, 0.2, 0.3]]]))
                }),
            )
            .route(
                "/models/wide",
                post(|| async { Json(json!([[0.1, 0.2, 0.3, 0.4]])) }),
            )
            .route(
                "/models/down",
                post(|| async {
                    (StatusCode::SERVICE_UNAVAILABLE, "Model is loading").into_response()
                }),
            )
            .route(
                "/models/slow",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    Json(json!([0.1, 0.2, 0.3]))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/models/{{model}}", addr)
    }

    fn embedder(endpoint: &str, model: &str) -> HuggingFaceEmbedder {
        HuggingFaceEmbedder::new(&EmbeddingConfig {
            model: model.into(),
            endpoint: endpoint.into(),
            dimensions: 3,
            api_key: Some("hf_test".into()),
            timeout_secs: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_nested_response_is_unwrapped() {
        let endpoint = spawn_inference().await;
        let embedding = embedder(&endpoint, "nested").embed("library hours").await.unwrap();
        assert_eq!(embedding.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_wrong_dimensions_are_rejected() {
        let endpoint = spawn_inference().await;
        let err = embedder(&endpoint, "wide").embed("x").await.unwrap_err();
        assert!(matches!(err, Error::EmbeddingShape(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_embedding_error() {
        let endpoint = spawn_inference().await;
        let err = embedder(&endpoint, "down").embed("x").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Model is loading"));
    }

    #[tokio::test]
    async fn test_timeout_is_embedding_error() {
        let endpoint = spawn_inference().await;
        let err = embedder(&endpoint, "slow").embed("x").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
