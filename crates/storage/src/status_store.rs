// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StatusStore`: the facade over both namespaces (§4.1) plus the orphan
//! sweep that heals after a worker crash (§4.1, §7, §8 scenario 6).

use std::collections::BTreeMap;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tagq_core::{JobId, JobStatus, ProcessStatus};

use crate::error::StoreError;
use crate::layout::Layout;
use crate::record_store::RecordStore;

/// Message written back to a job whose worker process died mid-flight
/// (§4.1 "orphan sweep", §8 scenario 6).
pub const ORPHAN_MESSAGE: &str = "File processing ended. Retry later.";

pub struct StatusStore {
    layout: Layout,
    jobs: RecordStore<JobStatus>,
    processes: RecordStore<ProcessStatus>,
}

impl StatusStore {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        let jobs = RecordStore::new(layout.status.clone(), lock_timeout);
        let processes = RecordStore::new(layout.process.clone(), lock_timeout);
        Self { layout, jobs, processes }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // --- job status namespace ---

    pub fn put_job(&self, id: &JobId, status: &JobStatus) -> Result<(), StoreError> {
        self.jobs.put(id.as_str(), status)
    }

    /// Never fails: a missing or corrupt record synthesizes the absent
    /// value rather than propagating an error to the caller (§4.1, §7).
    pub fn get_job(&self, id: &JobId) -> JobStatus {
        match self.jobs.get(id.as_str()) {
            Ok(Some(status)) => status,
            Ok(None) => JobStatus::absent(),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "status read failed, synthesizing absent");
                JobStatus::absent()
            }
        }
    }

    pub fn job_exists(&self, id: &JobId) -> bool {
        self.jobs.exists(id.as_str())
    }

    /// Delete a job's status record and, if a worker is actively handling
    /// it, kill that worker and remove its process record too. Idempotent.
    pub fn delete_job(&self, id: &JobId) -> Result<(), StoreError> {
        if let Some(process) = self.processes.get(id.as_str())? {
            let _ = kill(Pid::from_raw(process.pid as i32), Signal::SIGKILL);
            self.processes.delete(id.as_str())?;
        }
        self.jobs.delete(id.as_str())
    }

    // --- process status namespace ---

    pub fn put_process(&self, id: &JobId, process: &ProcessStatus) -> Result<(), StoreError> {
        self.processes.put(id.as_str(), process)
    }

    pub fn delete_process(&self, id: &JobId) -> Result<(), StoreError> {
        self.processes.delete(id.as_str())
    }

    // --- derived queries (§4.1) ---

    /// Enumerate and filter by `pending=true`. Runs the orphan sweep first,
    /// per §4.1: "before any enumeration that feeds scheduling decisions".
    pub fn pending_jobs(&self) -> Result<Vec<JobId>, StoreError> {
        self.sweep_orphans()?;
        let mut ids = Vec::new();
        for name in self.jobs.enumerate()? {
            let id = JobId::from(name);
            if self.get_job(&id).pending {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn any_busy(&self) -> Result<bool, StoreError> {
        for name in self.jobs.enumerate()? {
            if self.get_job(&JobId::from(name)).busy {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// All persisted job statuses, keyed by id. Runs the orphan sweep first
    /// (this backs `GET /status`).
    pub fn all_statuses(&self) -> Result<BTreeMap<JobId, JobStatus>, StoreError> {
        self.sweep_orphans()?;
        let mut out = BTreeMap::new();
        for name in self.jobs.enumerate()? {
            let id = JobId::from(name);
            let status = self.get_job(&id);
            out.insert(id, status);
        }
        Ok(out)
    }

    /// Scan the process namespace; for each process status whose recorded
    /// pid is no longer alive, delete the stale process status and reset
    /// the job to PENDING. Returns the number of jobs healed.
    pub fn sweep_orphans(&self) -> Result<usize, StoreError> {
        let mut healed = 0;
        for name in self.processes.enumerate()? {
            let Some(process) = self.processes.get(&name)? else { continue };
            if !pid_alive(process.pid) {
                self.processes.delete(&name)?;
                let id = JobId::from(name);
                self.put_job(&id, &JobStatus::pending(ORPHAN_MESSAGE))?;
                healed += 1;
            }
        }
        Ok(healed)
    }
}

/// Test whether `pid` refers to a live process, via a signal-0 probe
/// (§9: "retain as the cross-platform-ish idiom").
fn pid_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}
