// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-job worker procedure (§4.3 "Per-job worker procedure", steps
//! 1-7). Written as a pure function over `&dyn Tagger` and `&StatusStore`
//! so it is directly unit-testable without spawning a real worker-child
//! process; the worker-child's main loop (`tagq-server`'s `worker-child`
//! subcommand) calls this for every job it receives.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tagq_core::{JobId, JobStatus, ProcessStatus};
use tagq_storage::StatusStore;
use tagq_tagger::Tagger;

use crate::callback::{CallbackClient, Retention};
use crate::error::EngineError;
use crate::timeout;

const SIZE_PROBE_BACKOFF: Duration = Duration::from_secs(1);
const SIZE_PROBE_MAX_ATTEMPTS: u32 = 30;

/// Outcome of a completed job, distinguishing a timeout from any other
/// failure — only a genuine timeout causes a worker-child to recycle
/// itself (see `tagq-server`'s worker-child loop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Finished,
    Failed { timed_out: bool },
}

/// Run steps 1-7 of the per-job worker procedure for `id`. `tagger` has
/// already been `initialize()`-d.
pub async fn run_job(
    tagger: &dyn Tagger,
    store: &StatusStore,
    id: &JobId,
    callback: Option<&CallbackClient>,
) -> Result<JobOutcome, EngineError> {
    let layout = store.layout().clone();
    let input_path = layout.input_path(id.as_str());

    // Step 1: record the process status before doing anything else, so an
    // orphan sweep can find and heal this job if the process dies below.
    store.put_process(id, &ProcessStatus::new(std::process::id()))?;

    // Step 2: probe input size.
    let input_bytes = match probe_size(&input_path).await {
        Ok(bytes) => bytes,
        Err(err) => return fail(store, callback, id, &input_path, err.to_string(), false).await,
    };

    // Step 3-4: compute and announce the deadline.
    let deadline = timeout::compute(input_bytes, tagger.processing_speed());
    store.put_job(
        id,
        &JobStatus::busy(format!("Will process with a timeout after {} seconds", deadline.as_secs())),
    )?;

    let output_path = layout.output_path(id.as_str(), tagger.output_extension());

    // Step 5: invoke the tagger under the deadline.
    match tokio::time::timeout(deadline, tagger.process(&input_path, &output_path)).await {
        Ok(Ok(())) => finish(store, callback, id, &input_path, &output_path).await,
        Ok(Err(tagger_err)) => fail(store, callback, id, &input_path, tagger_err.to_string(), false).await,
        Err(_elapsed) => {
            fail(store, callback, id, &input_path, "ETIME: timed out waiting for tagger".to_string(), true).await
        }
    }
}

/// Step 2: stat the input file, retrying transient errors with a 1s
/// back-off; a `NotFound` is the "determined absent" case and fails
/// immediately rather than retrying.
async fn probe_size(input_path: &Path) -> Result<u64, EngineError> {
    for attempt in 0..SIZE_PROBE_MAX_ATTEMPTS {
        match tokio::fs::metadata(input_path).await {
            Ok(meta) => return Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::FileNotFound(input_path.to_path_buf()));
            }
            Err(e) if attempt + 1 == SIZE_PROBE_MAX_ATTEMPTS => {
                return Err(EngineError::io(input_path, e));
            }
            Err(_) => tokio::time::sleep(SIZE_PROBE_BACKOFF).await,
        }
    }
    unreachable!("loop always returns before exhausting its own bound")
}

/// Step 6: success path.
async fn finish(
    store: &StatusStore,
    callback: Option<&CallbackClient>,
    id: &JobId,
    input_path: &Path,
    output_path: &Path,
) -> Result<JobOutcome, EngineError> {
    store.delete_process(id)?;
    store.put_job(id, &JobStatus::finished("Removing input file"))?;
    remove_if_present(input_path).await?;

    let size = tokio::fs::metadata(output_path).await.map(|m| m.len()).unwrap_or(0);
    store.put_job(id, &JobStatus::finished(format!("Finished: wrote {size} bytes")))?;

    if let Some(callback) = callback {
        match callback.send_result(id, output_path).await {
            Ok(Retention::Delete) => {
                let _ = tokio::fs::remove_file(output_path).await;
            }
            Ok(Retention::Keep) => {}
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "result callback delivery failed, retaining output");
            }
        }
        store.delete_job(id)?;
    }

    Ok(JobOutcome::Finished)
}

/// Step 7: failure path (tagger error or timeout).
async fn fail(
    store: &StatusStore,
    callback: Option<&CallbackClient>,
    id: &JobId,
    input_path: &Path,
    reason: String,
    timed_out: bool,
) -> Result<JobOutcome, EngineError> {
    store.delete_process(id)?;
    let message = format!("An exception occurred: {reason}");
    store.put_job(id, &JobStatus::error(message.clone()))?;

    let error_path = store.layout().error_path(id.as_str());
    if tokio::fs::metadata(input_path).await.is_ok() {
        if let Err(e) = tokio::fs::rename(input_path, &error_path).await {
            tracing::warn!(id = %id, error = %e, "failed to move input to error directory");
        }
    }

    if let Some(callback) = callback {
        callback.send_error(id, &message).await;
    }

    Ok(JobOutcome::Failed { timed_out })
}

async fn remove_if_present(path: &Path) -> Result<(), EngineError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::io(path, e)),
    }
}
