// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tagq_core::JobId;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Serialize)]
struct ProcessedFiles {
    processed_files: Vec<String>,
}

/// `GET /output` (§4.2).
pub async fn list(State(state): State<AppState>) -> Result<Json<ProcessedFiles>, ServerError> {
    let mut processed_files = Vec::new();
    let entries = std::fs::read_dir(&state.store.layout().output)?;
    for entry in entries {
        let entry = entry?;
        if entry.metadata()?.is_file() {
            processed_files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(Json(ProcessedFiles { processed_files }))
}

/// `GET /output/<id>` (§4.2): raw bytes of the tagged output.
pub async fn one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Bytes, ServerError> {
    let path = state.store.layout().output_path(&id, &state.output_extension);
    let bytes = tokio::fs::read(&path).await.map_err(|_| ServerError::NotFound(format!("no output for {id}")))?;
    Ok(Bytes::from(bytes))
}

/// `DELETE /output/<id>` (§4.2): unconditionally 200, deletes the status,
/// the output file if present, and kills any active worker for `id`.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ServerError> {
    let id = JobId::from(id);
    let output_path = state.store.layout().output_path(id.as_str(), &state.output_extension);
    let _ = tokio::fs::remove_file(&output_path).await;
    state.pool.cancel(&id);
    state.store.delete_job(&id)?;
    Ok(StatusCode::OK)
}
