// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tagq_engine::WorkerPool;
use tagq_storage::StatusStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StatusStore>,
    pub pool: Arc<WorkerPool>,
    pub output_extension: Arc<str>,
    pub processing_speed: u64,
}
