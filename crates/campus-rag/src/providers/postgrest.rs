//! pgvector behind PostgREST
//!
//! Expects a `documents (content text, content_hash text, embedding vector(D))`
//! table and a `match_documents(query_embedding, match_count)` function
//! returning rows with at least `content` (and optionally `similarity`).

use async_trait::async_trait;
use std::time::Duration;

use crate::config::VectorStoreConfig;
use crate::embeddings::Embedding;
use crate::error::{Error, Result};
use crate::providers::vector_store::VectorStoreProvider;
use crate::types::{DocumentRow, RetrievedChunk};

/// Vector store reached over PostgREST
pub struct PostgrestVectorStore {
    client: reqwest::Client,
    base_url: String,
    service_key: Option<String>,
    dimensions: usize,
}

#[derive(serde::Serialize)]
struct InsertRow<'a> {
    content: &'a str,
    content_hash: &'a str,
    embedding: String,
}

#[derive(serde::Serialize)]
struct MatchParams {
    query_embedding: String,
    match_count: usize,
}

#[derive(serde::Deserialize)]
struct MatchRow {
    content: String,
    #[serde(default)]
    similarity: Option<f32>,
}

impl PostgrestVectorStore {
    pub fn new(config: &VectorStoreConfig, dimensions: usize) -> Result<Self> {
        let base_url = config
            .postgrest_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .ok_or_else(|| Error::Config("vector_store.postgrest_url is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build PostgREST client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            service_key: config.postgrest_key.clone(),
            dimensions,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/rest/v1/{}", self.base_url, path));
        if let Some(key) = &self.service_key {
            builder = builder.header("apikey", key).bearer_auth(key);
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("PostgREST request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!("PostgREST returned {}: {}", status, body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorStoreProvider for PostgrestVectorStore {
    async fn insert_rows(&self, rows: &[DocumentRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let payload: Vec<InsertRow<'_>> = rows
            .iter()
            .map(|r| InsertRow {
                content: &r.content,
                content_hash: &r.content_hash,
                embedding: r.embedding.to_literal(),
            })
            .collect();

        self.send(
            self.request(reqwest::Method::POST, "documents")
                .header("Prefer", "return=minimal")
                .json(&payload),
        )
        .await?;
        Ok(rows.len())
    }

    async fn contains_hash(&self, content_hash: &str) -> Result<bool> {
        let response = self
            .send(
                self.request(reqwest::Method::GET, "documents")
                    .query(&[
                        ("select", "content_hash".to_string()),
                        ("content_hash", format!("eq.{}", content_hash)),
                        ("limit", "1".to_string()),
                    ]),
            )
            .await?;
        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse PostgREST response: {}", e)))?;
        Ok(!rows.is_empty())
    }

    async fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if query.dimensions() != self.dimensions {
            return Err(Error::vector_db(format!(
                "query has {} dimensions, store holds {}",
                query.dimensions(),
                self.dimensions
            )));
        }

        let response = self
            .send(
                self.request(reqwest::Method::POST, "rpc/match_documents")
                    .json(&MatchParams {
                        query_embedding: query.to_literal(),
                        match_count: top_k,
                    }),
            )
            .await?;
        let rows: Vec<MatchRow> = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse match_documents rows: {}", e)))?;

        Ok(rows
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(i, row)| RetrievedChunk {
                content: row.content,
                rank: i + 1,
                similarity: row.similarity.unwrap_or_default(),
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        let response = self
            .send(
                self.request(reqwest::Method::HEAD, "documents")
                    .header("Prefer", "count=exact"),
            )
            .await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| Error::vector_db("PostgREST did not report a row count"))?;
        Ok(total)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.len().await.is_ok())
    }

    fn name(&self) -> &str {
        "postgrest"
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`
fn parse_content_range_total(header: &str) -> Option<usize> {
    header.rsplit('/').next()?.trim().parse().ok()
}
