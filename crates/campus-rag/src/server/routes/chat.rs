//! Question answering endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::extract::{ApiJson, Authenticated};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /api/chat - Answer a question, grounded or open-domain
pub async fn chat(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let start = Instant::now();
    tracing::info!(uid = %caller.uid, "Question: \"{}\"", request.question.trim());

    let answer = state.answer_pipeline().answer(&caller.uid, &request).await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        mode = answer.mode.as_str(),
        sources = answer.sources.len(),
        "Answered in {}ms",
        processing_time_ms
    );

    Ok(Json(ChatResponse::from_answer(answer, processing_time_ms)))
}
