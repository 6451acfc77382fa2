// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Serialize)]
struct ErrorFiles {
    error_files: Vec<String>,
}

/// `GET /error` (§4.2).
pub async fn list(State(state): State<AppState>) -> Result<Json<ErrorFiles>, ServerError> {
    let mut error_files = Vec::new();
    let entries = std::fs::read_dir(&state.store.layout().error)?;
    for entry in entries {
        let entry = entry?;
        if entry.metadata()?.is_file() {
            error_files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(Json(ErrorFiles { error_files }))
}

/// `GET /error/<id>` (§4.2): raw bytes of the failed input.
pub async fn one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Bytes, ServerError> {
    let path = state.store.layout().error_path(&id);
    let bytes = tokio::fs::read(&path).await.map_err(|_| ServerError::NotFound(format!("no error file for {id}")))?;
    Ok(Bytes::from(bytes))
}
