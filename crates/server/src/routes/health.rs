// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::State;
use axum::Json;
use tagq_core::HealthReport;

use crate::state::AppState;

/// `GET /health` (§4.2, §6). `queueSizeAtTagger` is the aggregate byte
/// size of everything in `input/`, not a single file.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let queue_size_at_tagger = input_dir_bytes(&state);
    Json(HealthReport {
        healthy: true,
        queue_size_at_tagger,
        processing_speed: state.processing_speed,
        message: "ok".to_string(),
    })
}

fn input_dir_bytes(state: &AppState) -> u64 {
    let Ok(entries) = std::fs::read_dir(&state.store.layout().input) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}
