// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use tagq_core::{JobId, JobStatus};

use crate::error::ServerError;
use crate::state::AppState;

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html>
<body>
<form action="/input" method="post" enctype="multipart/form-data">
  <input type="file" name="file">
  <input type="submit" value="Upload">
</form>
</body>
</html>
"#;

pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// `POST /input` (§4.2): writes `input/<id>` and a PENDING status record,
/// returning the bare identifier as the response body.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<String, ServerError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| ServerError::BadRequest(e.to_string()))? {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| ServerError::BadRequest(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ServerError::BadRequest("empty file".to_string()));
        }
        let id = JobId::new();
        let input_path = state.store.layout().input_path(id.as_str());
        tokio::fs::write(&input_path, &bytes).await?;
        state.store.put_job(&id, &JobStatus::pending("Waiting to be processed"))?;
        return Ok(id.to_string());
    }
    Err(ServerError::BadRequest("missing file field".to_string()))
}

/// `DELETE /input/<id>` (§4.2, §4.3 "Cancellation").
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ServerError> {
    let id = JobId::from(id);
    let input_path = state.store.layout().input_path(id.as_str());
    if !input_path.is_file() {
        return Err(ServerError::BadRequest("input not on server".to_string()));
    }
    tokio::fs::remove_file(&input_path).await?;
    state.pool.cancel(&id);
    state.store.delete_job(&id)?;
    Ok(StatusCode::OK)
}
