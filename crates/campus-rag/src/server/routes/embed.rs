//! Embedding passthrough endpoint

use axum::{extract::State, Json};

use crate::error::{Error, Result};
use crate::server::extract::{ApiJson, Authenticated};
use crate::server::state::AppState;
use crate::types::{EmbedRequest, EmbedResponse};

/// POST /api/embed - Embed arbitrary text with the configured model
pub async fn embed_text(
    State(state): State<AppState>,
    _caller: Authenticated,
    ApiJson(request): ApiJson<EmbedRequest>,
) -> Result<Json<EmbedResponse>> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(Error::invalid_input("text is required"));
    }

    let embedding = state.embedding_provider().embed(text).await?;
    Ok(Json(EmbedResponse {
        embedding: embedding.into_inner(),
    }))
}
