//! Document ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::extract::Admin;
use crate::server::state::AppState;
use crate::types::{IngestResponse, IngestSource};

fn check_upload_size(len: usize, max_upload_size: usize) -> Result<()> {
    if len > max_upload_size {
        return Err(Error::invalid_input(format!(
            "Upload of {} bytes exceeds the {} byte limit",
            len, max_upload_size
        )));
    }
    Ok(())
}

/// POST /api/documents - Ingest one uploaded file or pasted text
///
/// Multipart fields: `file` (.pdf or .txt) or `text`. A non-empty file wins
/// over pasted text.
pub async fn ingest_document(
    State(state): State<AppState>,
    Admin(caller): Admin,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();
    let max_upload_size = state.config().server.max_upload_size;

    let mut file: Option<IngestSource> = None;
    let mut pasted: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::invalid_input(format!("Failed to read file: {}", e)))?;
                check_upload_size(data.len(), max_upload_size)?;
                if !data.is_empty() {
                    file = Some(IngestSource::file(filename, data));
                }
            }
            "text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::invalid_input(format!("Failed to read text: {}", e)))?;
                check_upload_size(text.len(), max_upload_size)?;
                if !text.trim().is_empty() {
                    pasted = Some(text);
                }
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let source = file
        .or_else(|| pasted.map(IngestSource::text))
        .ok_or_else(|| Error::invalid_input("Provide a file (.pdf or .txt) or paste text content."))?;

    tracing::info!("{} uploading {}", caller.uid, source.label());
    let report = state.ingest_pipeline().ingest(source).await?;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Ingestion complete: {}/{} chunks inserted, {} duplicate, {} failed in {}ms",
        report.chunks_inserted,
        report.total_chunks,
        report.chunks_duplicate,
        report.errors.len(),
        processing_time_ms
    );

    Ok(Json(IngestResponse::from_report(report, processing_time_ms)))
}
