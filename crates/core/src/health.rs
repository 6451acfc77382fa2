// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /health` response shape (§6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    #[serde(rename = "queueSizeAtTagger")]
    pub queue_size_at_tagger: u64,
    #[serde(rename = "processingSpeed")]
    pub processing_speed: u64,
    pub message: String,
}
