// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the status-store invariants P1-P6.

use std::time::Duration;

use proptest::prelude::*;
use tagq_core::{JobId, JobStatus, ProcessStatus};

use crate::layout::Layout;
use crate::status_store::{StatusStore, ORPHAN_MESSAGE};

fn store() -> (tempfile::TempDir, StatusStore) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = Layout::create(tmp.path()).unwrap();
    (tmp, StatusStore::new(layout, Duration::from_secs(1)))
}

// P1: exactly one phase flag is true for every constructor.
#[yare::parameterized(
    pending = { JobStatus::pending("p") },
    busy = { JobStatus::busy("b") },
    error = { JobStatus::error("e") },
    finished = { JobStatus::finished("f") },
)]
fn p1_exactly_one_flag_true(status: JobStatus) {
    let flags = [status.pending, status.busy, status.error, status.finished];
    assert_eq!(flags.iter().filter(|f| **f).count(), 1);
}

// P2: a live process status implies its job is busy; a dead one is healed
// by the next sweep rather than left dangling.
#[test]
fn p2_live_process_implies_busy_job() {
    let (_tmp, store) = store();
    let id = JobId::new();
    store.put_job(&id, &JobStatus::busy("tagging")).unwrap();
    store.put_process(&id, &ProcessStatus::new(std::process::id())).unwrap();

    store.sweep_orphans().unwrap();
    assert!(store.get_job(&id).busy);
}

#[test]
fn p2_dead_process_is_healed_not_left_dangling() {
    let (_tmp, store) = store();
    let id = JobId::new();
    store.put_job(&id, &JobStatus::busy("tagging")).unwrap();
    store.put_process(&id, &ProcessStatus::new(999_999)).unwrap();

    store.sweep_orphans().unwrap();
    let status = store.get_job(&id);
    assert!(status.pending);
    assert_eq!(status.message, ORPHAN_MESSAGE);
}

// P3: a job only ever moves PENDING -> (BUSY ->)+ (FINISHED|ERROR), never
// backwards and never skipping to a non-adjacent phase directly.
#[test]
fn p3_transitions_follow_the_declared_order() {
    let (_tmp, store) = store();
    let id = JobId::new();
    let mut seen = Vec::new();

    store.put_job(&id, &JobStatus::pending("queued")).unwrap();
    seen.push(phase(&store.get_job(&id)));
    store.put_job(&id, &JobStatus::busy("tagging")).unwrap();
    seen.push(phase(&store.get_job(&id)));
    store.put_job(&id, &JobStatus::busy("still tagging")).unwrap();
    seen.push(phase(&store.get_job(&id)));
    store.put_job(&id, &JobStatus::finished("done")).unwrap();
    seen.push(phase(&store.get_job(&id)));

    assert_eq!(seen, vec!["pending", "busy", "busy", "finished"]);
}

fn phase(status: &JobStatus) -> &'static str {
    if status.pending {
        "pending"
    } else if status.busy {
        "busy"
    } else if status.error {
        "error"
    } else if status.finished {
        "finished"
    } else {
        "absent"
    }
}

// P5: enumerating after uploading N distinct jobs yields N records, each
// keyed by its own id.
proptest! {
    #[test]
    fn p5_enumerating_n_jobs_yields_n_records(n in 0usize..12) {
        let (_tmp, store) = store();
        let ids: Vec<JobId> = (0..n).map(|_| JobId::new()).collect();
        for id in &ids {
            store.put_job(id, &JobStatus::pending("queued")).unwrap();
        }

        let statuses = store.all_statuses().unwrap();
        prop_assert_eq!(statuses.len(), n);
        for id in &ids {
            prop_assert!(statuses.contains_key(id));
        }
    }
}

// P6: deleting a job whose worker is running removes both records; no
// further status write can resurrect it through the normal API surface.
#[test]
fn p6_deleting_a_busy_job_leaves_no_trace() {
    let (_tmp, store) = store();
    let id = JobId::new();
    store.put_job(&id, &JobStatus::busy("tagging")).unwrap();
    store.put_process(&id, &ProcessStatus::new(std::process::id())).unwrap();

    store.delete_job(&id).unwrap();

    assert!(store.get_job(&id).is_absent());
    assert!(!store.job_exists(&id));
}
