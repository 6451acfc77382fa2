// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status and process status records (§3, §6).
//!
//! `JobStatus` intentionally mirrors the wire JSON shape field-for-field
//! (one `message` string plus four mutually exclusive phase flags) rather
//! than being a Rust enum with a custom `Serialize` impl: the schema is
//! part of the external contract (`GET /status/<id>`), so the struct layout
//! and the JSON layout are kept identical on purpose.

use serde::{Deserialize, Serialize};

/// The message returned when no status record exists for an id.
pub const NOT_ON_SERVER: &str = "File not on server";

/// A job's lifecycle record (§3 "Job status record").
///
/// Invariant I1: exactly one of `pending`, `busy`, `error`, `finished` is
/// `true` in every value ever handed to the status store for persistence.
/// The all-false value is never persisted; it is synthesized by the store
/// when no record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub message: String,
    pub pending: bool,
    pub busy: bool,
    pub error: bool,
    pub finished: bool,
}

impl JobStatus {
    pub fn pending(message: impl Into<String>) -> Self {
        Self { message: message.into(), pending: true, busy: false, error: false, finished: false }
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self { message: message.into(), pending: false, busy: true, error: false, finished: false }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), pending: false, busy: false, error: true, finished: false }
    }

    pub fn finished(message: impl Into<String>) -> Self {
        Self { message: message.into(), pending: false, busy: false, error: false, finished: true }
    }

    /// The synthetic value returned for an id with no persisted record.
    pub fn absent() -> Self {
        Self {
            message: NOT_ON_SERVER.to_string(),
            pending: false,
            busy: false,
            error: false,
            finished: false,
        }
    }

    /// True if this is the synthetic all-false value (no phase flag set).
    pub fn is_absent(&self) -> bool {
        !self.pending && !self.busy && !self.error && !self.finished
    }
}

/// A process status record (§3): the pid of the worker currently handling
/// a job. Only exists in the process namespace while the job is busy (I2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    pub pid: u32,
}

impl ProcessStatus {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_flag_true_for_every_constructor() {
        let cases = [
            JobStatus::pending("p"),
            JobStatus::busy("b"),
            JobStatus::error("e"),
            JobStatus::finished("f"),
        ];
        for status in cases {
            let flags = [status.pending, status.busy, status.error, status.finished];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        }
    }

    #[test]
    fn absent_has_no_flags_set_and_is_not_persisted_shape() {
        let absent = JobStatus::absent();
        assert!(absent.is_absent());
        assert_eq!(absent.message, NOT_ON_SERVER);
    }

    #[test]
    fn json_shape_matches_the_wire_schema() {
        let status = JobStatus::busy("Parsing file");
        let value: serde_json::Value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["message"], "Parsing file");
        assert_eq!(value["busy"], true);
        assert_eq!(value["pending"], false);
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_messages_round_trip_through_json(message in ".{0,256}") {
            for status in [
                JobStatus::pending(message.clone()),
                JobStatus::busy(message.clone()),
                JobStatus::error(message.clone()),
                JobStatus::finished(message.clone()),
            ] {
                let json = serde_json::to_string(&status).unwrap();
                let back: JobStatus = serde_json::from_str(&json).unwrap();
                proptest::prop_assert_eq!(status, back);
            }
        }

        #[test]
        fn arbitrary_pids_round_trip_through_json(pid in proptest::num::u32::ANY) {
            let status = ProcessStatus::new(pid);
            let json = serde_json::to_string(&status).unwrap();
            let back: ProcessStatus = serde_json::from_str(&json).unwrap();
            proptest::prop_assert_eq!(status, back);
        }
    }
}
