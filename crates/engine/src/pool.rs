// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker Supervisor's pool of long-lived worker-child processes
//! (§4.3 "Pool contract", §9 "Global initialized tagger state").
//!
//! Each slot is a real OS process, spawned as `tagqd worker-child --root
//! <dir>`, not a thread or async task, so a tagger holding GPU or other
//! fork-incompatible state gets a genuinely fresh address space. The pool
//! speaks the `tagq-wire` NDJSON protocol to each child and never sends a
//! second request before the first is answered, which is what keeps "at
//! most one busy job per slot" (I3) true.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tagq_core::JobId;
use tagq_storage::StatusStore;
use tagq_wire::{ChildRequest, ChildResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

use crate::callback::CallbackClient;
use crate::error::EngineError;
use crate::timeout::SUPERVISOR_GRACE;

struct Slot {
    child: Child,
    stdin: ChildStdin,
    stdout: tokio::io::Lines<BufReader<ChildStdout>>,
    current: Option<JobId>,
}

#[derive(Clone)]
struct Spawner {
    worker_exe: PathBuf,
    state_dir: PathBuf,
}

impl Spawner {
    /// Spawn a fresh worker-child and block until it reports `Ready`.
    async fn spawn(&self) -> Result<(Slot, u32), EngineError> {
        let mut child = tokio::process::Command::new(&self.worker_exe)
            .arg("worker-child")
            .arg("--root")
            .arg(&self.state_dir)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::io(&self.worker_exe, e))?;

        let pid = child.id().ok_or(EngineError::ChildNotReady)?;
        let stdin = child.stdin.take().ok_or(EngineError::ChildNotReady)?;
        let stdout = child.stdout.take().ok_or(EngineError::ChildNotReady)?;
        let mut lines = BufReader::new(stdout).lines();

        match lines.next_line().await {
            Ok(Some(line)) => match ChildResponse::decode(&line)? {
                ChildResponse::Ready => {}
                _ => return Err(EngineError::ChildNotReady),
            },
            _ => return Err(EngineError::ChildNotReady),
        }

        Ok((Slot { child, stdin, stdout: lines, current: None }, pid))
    }
}

/// A pool of `num_workers` warm worker-child processes.
pub struct WorkerPool {
    slots: Vec<Arc<TokioMutex<Slot>>>,
    pids: Vec<Arc<AtomicU32>>,
    /// Set by `cancel()` before it signals the child, so the dispatching
    /// `run_slot` task can tell "killed because cancelled" apart from
    /// "died/hung on its own" once it observes the child's exit (§4.3
    /// "Cancellation", §5, P6).
    cancelled: Vec<Arc<AtomicBool>>,
    registry: Arc<StdMutex<HashMap<JobId, usize>>>,
    spawner: Spawner,
    store: Arc<StatusStore>,
    callback: Option<Arc<CallbackClient>>,
}

impl WorkerPool {
    pub async fn spawn(
        num_workers: usize,
        worker_exe: PathBuf,
        state_dir: PathBuf,
        store: Arc<StatusStore>,
        callback: Option<Arc<CallbackClient>>,
    ) -> Result<Self, EngineError> {
        let spawner = Spawner { worker_exe, state_dir };
        let mut slots = Vec::with_capacity(num_workers);
        let mut pids = Vec::with_capacity(num_workers);
        let mut cancelled = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let (slot, pid) = spawner.spawn().await?;
            slots.push(Arc::new(TokioMutex::new(slot)));
            pids.push(Arc::new(AtomicU32::new(pid)));
            cancelled.push(Arc::new(AtomicBool::new(false)));
        }
        Ok(Self { slots, pids, cancelled, registry: Arc::new(StdMutex::new(HashMap::new())), spawner, store, callback })
    }

    /// Number of slots not currently processing a job. A best-effort
    /// count (a slot may be claimed between this call and a subsequent
    /// `try_dispatch`), matching §4.3's "skip if already at num_workers".
    pub async fn available(&self) -> usize {
        let mut count = 0;
        for slot in &self.slots {
            if let Ok(guard) = slot.try_lock() {
                if guard.current.is_none() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Claim the first idle slot and dispatch `id` to it. Returns `false`
    /// if every slot is currently busy. The job runs to completion on a
    /// background task; `try_dispatch` itself returns as soon as dispatch
    /// has been handed off.
    pub fn try_dispatch(&self, id: JobId, input: PathBuf, output: PathBuf, deadline: Duration) -> bool {
        for (index, slot) in self.slots.iter().enumerate() {
            let Ok(mut guard) = Arc::clone(slot).try_lock_owned() else { continue };
            if guard.current.is_some() {
                continue;
            }
            guard.current = Some(id.clone());
            self.registry.lock().expect("registry mutex poisoned").insert(id.clone(), index);
            // This job has not been cancelled yet; any `cancelled` flag a
            // prior occupant of this slot left behind is already stale.
            self.cancelled[index].store(false, Ordering::SeqCst);

            let pid_cell = self.pids[index].clone();
            let cancelled_cell = self.cancelled[index].clone();
            let registry = self.registry.clone();
            let spawner = self.spawner.clone();
            let store = self.store.clone();
            let callback = self.callback.clone();
            let job_id = id.clone();

            tokio::spawn(async move {
                run_slot(guard, pid_cell, cancelled_cell, spawner, store, callback, job_id.clone(), input, output, deadline)
                    .await;
                registry.lock().expect("registry mutex poisoned").remove(&job_id);
            });
            return true;
        }
        false
    }

    /// Kill whichever slot is currently processing `id`, if any. Used by
    /// `DELETE /input/<id>` and `DELETE /output/<id>` (§4.3 "Cancellation").
    pub fn cancel(&self, id: &JobId) -> bool {
        let Some(&index) = self.registry.lock().expect("registry mutex poisoned").get(id) else {
            return false;
        };
        // Set before signaling: `run_slot` only observes this after the
        // child has actually died, so it always sees the flag we set here.
        self.cancelled[index].store(true, Ordering::SeqCst);
        let pid = self.pids[index].load(Ordering::SeqCst);
        if pid != 0 {
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
        }
        true
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_slot(
    mut guard: OwnedMutexGuard<Slot>,
    pid_cell: Arc<AtomicU32>,
    cancelled_cell: Arc<AtomicBool>,
    spawner: Spawner,
    store: Arc<StatusStore>,
    callback: Option<Arc<CallbackClient>>,
    id: JobId,
    input: PathBuf,
    output: PathBuf,
    deadline: Duration,
) {
    let request = match (ChildRequest::Process { id: id.clone(), input: input.clone(), output })
        .encode()
        .map_err(EngineError::from)
    {
        Ok(line) => line,
        Err(e) => {
            tracing::error!(id = %id, error = %e, "failed to encode worker-child request");
            guard.current = None;
            return;
        }
    };

    if let Err(e) = write_line(&mut guard.stdin, &request).await {
        tracing::warn!(id = %id, error = %e, "worker-child stdin closed, recycling slot");
        recycle(&mut guard, &pid_cell, &cancelled_cell, &spawner, &store, callback.as_deref(), &id, &input).await;
        return;
    }

    let wait = tokio::time::timeout(deadline + SUPERVISOR_GRACE, guard.stdout.next_line());
    match wait.await {
        Ok(Ok(Some(line))) => match ChildResponse::decode(&line) {
            Ok(ChildResponse::Done { .. }) => {
                guard.current = None;
            }
            Ok(ChildResponse::Failed { message, timed_out, .. }) => {
                tracing::info!(id = %id, message, "job failed, reported by worker-child");
                guard.current = None;
                if timed_out {
                    // The child already wrote ERROR / moved the input /
                    // sent the error callback itself before choosing to
                    // exit; the parent only needs to replace the process
                    // occupying the slot.
                    tracing::warn!(id = %id, "worker-child recycling itself after a timeout, respawning slot");
                    respawn_slot(&mut guard, &pid_cell, &spawner).await;
                }
            }
            Ok(ChildResponse::Ready) | Err(_) => {
                tracing::warn!(id = %id, "unexpected worker-child reply, recycling slot");
                recycle(&mut guard, &pid_cell, &cancelled_cell, &spawner, &store, callback.as_deref(), &id, &input).await;
            }
        },
        Ok(Ok(None)) => {
            tracing::warn!(id = %id, "worker-child closed stdout, recycling slot");
            recycle(&mut guard, &pid_cell, &cancelled_cell, &spawner, &store, callback.as_deref(), &id, &input).await;
        }
        Ok(Err(e)) => {
            tracing::warn!(id = %id, error = %e, "error reading worker-child reply, recycling slot");
            recycle(&mut guard, &pid_cell, &cancelled_cell, &spawner, &store, callback.as_deref(), &id, &input).await;
        }
        Err(_elapsed) => {
            tracing::warn!(id = %id, "worker-child exceeded its deadline, killing and recycling slot");
            recycle(&mut guard, &pid_cell, &cancelled_cell, &spawner, &store, callback.as_deref(), &id, &input).await;
        }
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

/// Dispatch to the right kind of recycle depending on whether `id` was
/// cancelled out from under this slot. A cancelled job's status record has
/// already been deleted by `DELETE /input/<id>` (§4.3 "Cancellation"); it
/// must stay absent, so this path must never resurrect it with an ERROR
/// write or fire its callback (§5, P6).
#[allow(clippy::too_many_arguments)]
async fn recycle(
    guard: &mut OwnedMutexGuard<Slot>,
    pid_cell: &AtomicU32,
    cancelled_cell: &AtomicBool,
    spawner: &Spawner,
    store: &StatusStore,
    callback: Option<&CallbackClient>,
    id: &JobId,
    input: &std::path::Path,
) {
    if cancelled_cell.swap(false, Ordering::SeqCst) {
        tracing::info!(id = %id, "slot died after cancellation, respawning without touching job status");
        respawn_slot(guard, pid_cell, spawner).await;
        return;
    }
    respawn_and_heal(guard, pid_cell, spawner, store, callback, id, input).await;
}

/// The supervisor/OS-kill fallback of §4.3 step 5: the child did not
/// answer within its own deadline plus grace, so the parent kills it,
/// performs the ERROR status write and error-directory move itself (the
/// child may not have gotten there), and respawns a fresh child into the
/// slot so the pool stays at full strength.
async fn respawn_and_heal(
    guard: &mut OwnedMutexGuard<Slot>,
    pid_cell: &AtomicU32,
    spawner: &Spawner,
    store: &StatusStore,
    callback: Option<&CallbackClient>,
    id: &JobId,
    input: &std::path::Path,
) {
    let dead_pid = pid_cell.load(Ordering::SeqCst);
    if dead_pid != 0 {
        let _ = kill(Pid::from_raw(dead_pid as i32), Signal::SIGKILL);
    }
    let _ = guard.child.kill().await;

    let message = "An exception occurred: worker did not respond within its deadline".to_string();
    if let Err(e) = store.delete_process(id) {
        tracing::warn!(id = %id, error = %e, "failed to clear process status during recycle");
    }
    if let Err(e) = store.put_job(id, &tagq_core::JobStatus::error(message.clone())) {
        tracing::warn!(id = %id, error = %e, "failed to write error status during recycle");
    }
    let error_path = store.layout().error_path(id.as_str());
    if tokio::fs::metadata(input).await.is_ok() {
        let _ = tokio::fs::rename(input, &error_path).await;
    }
    if let Some(callback) = callback {
        callback.send_error(id, &message).await;
    }

    match spawner.spawn().await {
        Ok((fresh, pid)) => {
            **guard = fresh;
            pid_cell.store(pid, Ordering::SeqCst);
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "failed to respawn worker-child slot");
            guard.current = None;
        }
    }
}

/// Replace a slot's child process with a fresh one without touching any
/// job's status record — used when the previous occupant already reported
/// its own terminal outcome before exiting for a reason unrelated to that
/// outcome: a cancelled job (status already deleted by the caller) or a
/// worker-child self-recycling after a timeout it already reported via
/// `ChildResponse::Failed` (§9 "Global initialized tagger state").
async fn respawn_slot(guard: &mut OwnedMutexGuard<Slot>, pid_cell: &AtomicU32, spawner: &Spawner) {
    let dead_pid = pid_cell.load(Ordering::SeqCst);
    if dead_pid != 0 {
        let _ = kill(Pid::from_raw(dead_pid as i32), Signal::SIGKILL);
    }
    let _ = guard.child.kill().await;

    match spawner.spawn().await {
        Ok((fresh, pid)) => {
            **guard = fresh;
            pid_cell.store(pid, Ordering::SeqCst);
        }
        Err(e) => tracing::error!(error = %e, "failed to respawn worker-child slot"),
    }
}
