//! Speech synthesis endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::Result;
use crate::server::extract::{ApiJson, Authenticated};
use crate::server::state::AppState;
use crate::types::SpeechRequest;

/// POST /api/tts - Synthesize speech, returning WAV bytes
pub async fn synthesize(
    State(state): State<AppState>,
    _caller: Authenticated,
    ApiJson(request): ApiJson<SpeechRequest>,
) -> Result<Response> {
    let audio = state
        .speech_provider()
        .synthesize(&request.text, &request.model)
        .await?;
    tracing::debug!("Synthesized {} bytes with {}", audio.len(), request.model);

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        audio,
    )
        .into_response())
}
