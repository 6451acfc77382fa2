// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::{Path, State};
use axum::Json;
use tagq_core::JobId;

use crate::error::ServerError;
use crate::state::AppState;

/// `GET /status` (§4.2): triggers the orphan sweep (§4.1) via `all_statuses`.
pub async fn all(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    let statuses = state.store.all_statuses()?;
    let map: serde_json::Map<String, serde_json::Value> = statuses
        .into_iter()
        .map(|(id, status)| (id.to_string(), serde_json::to_value(status).unwrap_or_default()))
        .collect();
    Ok(Json(serde_json::Value::Object(map)))
}

/// `GET /status/<id>` (§4.2): always 200, synthesizing the absent record
/// when no status exists for `id`. Triggers the orphan sweep first.
pub async fn one(State(state): State<AppState>, Path(id): Path<String>) -> Json<tagq_core::JobStatus> {
    if let Err(e) = state.store.sweep_orphans() {
        tracing::warn!(error = %e, "orphan sweep failed");
    }
    Json(state.store.get_job(&JobId::from(id)))
}
