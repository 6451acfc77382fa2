// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker Supervisor's scheduling loop (§4.3 "Scheduling loop").

use std::sync::Arc;
use std::time::Duration;

use tagq_core::JobStatus;
use tagq_storage::StatusStore;

use crate::pool::WorkerPool;
use crate::timeout;

/// Runs the scheduling loop forever: on each tick, fetch pending jobs
/// (which also triggers the orphan sweep, §4.1) and dispatch as many as
/// the pool has idle slots for.
pub async fn run(
    store: Arc<StatusStore>,
    pool: Arc<WorkerPool>,
    output_extension: String,
    processing_speed: u64,
    poll_interval: Duration,
) {
    loop {
        if let Err(e) = tick(&store, &pool, &output_extension, processing_speed).await {
            tracing::warn!(error = %e, "scheduling tick failed");
        }
        tokio::time::sleep(poll_interval).await;
    }
}

async fn tick(
    store: &StatusStore,
    pool: &WorkerPool,
    output_extension: &str,
    processing_speed: u64,
) -> Result<(), tagq_storage::StoreError> {
    let available = pool.available().await;
    if available == 0 {
        return Ok(());
    }

    let pending = store.pending_jobs()?;
    let mut dispatched = 0;
    for id in pending {
        if dispatched >= available {
            break;
        }
        // Step 3: re-verify the status is still pending (it may have been
        // claimed or deleted since the enumeration above).
        if !store.get_job(&id).pending {
            continue;
        }
        store.put_job(&id, &JobStatus::busy("Parsing file"))?;

        let input_path = store.layout().input_path(id.as_str());
        let output_path = store.layout().output_path(id.as_str(), output_extension);
        let input_bytes = std::fs::metadata(&input_path).map(|m| m.len()).unwrap_or(0);
        let deadline = timeout::compute(input_bytes, processing_speed);

        if pool.try_dispatch(id.clone(), input_path, output_path, deadline) {
            dispatched += 1;
        } else {
            // Lost the race for a slot `available()` reported as free.
            break;
        }
    }
    Ok(())
}
