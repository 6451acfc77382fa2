// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tagq_core::JobId;
use thiserror::Error;

/// A message sent from the parent to a worker-child on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChildRequest {
    /// Process one job. The child already knows the state-dir root (passed
    /// as a CLI argument at spawn time), so only the id and the two paths
    /// it needs are carried here.
    Process { id: JobId, input: PathBuf, output: PathBuf },
}

/// A message sent from a worker-child to the parent on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChildResponse {
    /// Emitted exactly once, after `Tagger::initialize()` completes.
    Ready,
    /// The job finished successfully; the status store already reflects it.
    Done { id: JobId },
    /// The job failed (tagger error or timeout); the status store already
    /// reflects ERROR, and the input has already been moved to `error/` if
    /// it still existed. `timed_out` tells the parent this worker-child is
    /// about to exit on its own, so the slot needs a fresh child spawned
    /// before the next dispatch — no further status/callback work needed.
    Failed { id: JobId, message: String, timed_out: bool },
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed protocol line: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("child stdin/stdout closed unexpectedly")]
    Closed,
}

impl ChildRequest {
    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(line: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(line)?)
    }
}

impl ChildResponse {
    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(line: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn process_request_round_trips() {
        let req = ChildRequest::Process {
            id: JobId::new(),
            input: PathBuf::from("/tmp/input/abc"),
            output: PathBuf::from("/tmp/output/abc.tsv"),
        };
        let line = req.encode().unwrap();
        assert!(!line.contains('\n'), "protocol lines must not embed newlines");
        let back = ChildRequest::decode(&line).unwrap();
        match back {
            ChildRequest::Process { input, output, .. } => {
                assert_eq!(input, PathBuf::from("/tmp/input/abc"));
                assert_eq!(output, PathBuf::from("/tmp/output/abc.tsv"));
            }
        }
    }

    #[test]
    fn ready_and_failed_round_trip() {
        let ready = ChildResponse::Ready;
        assert!(matches!(ChildResponse::decode(&ready.encode().unwrap()).unwrap(), ChildResponse::Ready));

        let failed = ChildResponse::Failed { id: JobId::new(), message: "boom".into(), timed_out: true };
        let line = failed.encode().unwrap();
        match ChildResponse::decode(&line).unwrap() {
            ChildResponse::Failed { message, timed_out, .. } => {
                assert_eq!(message, "boom");
                assert!(timed_out);
            }
            _ => panic!("expected Failed"),
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(ChildResponse::decode("not json").is_err());
    }

    proptest! {
        #[test]
        fn process_request_round_trips_for_arbitrary_paths(
            input_raw in "[a-zA-Z0-9/_.-]{1,64}",
            output_raw in "[a-zA-Z0-9/_.-]{1,64}",
            message in "[ -~]{0,128}",
        ) {
            let req = ChildRequest::Process {
                id: JobId::new(),
                input: PathBuf::from(&input_raw),
                output: PathBuf::from(&output_raw),
            };
            let decoded = ChildRequest::decode(&req.encode().unwrap()).unwrap();
            let ChildRequest::Process { input, output, .. } = decoded;
            prop_assert_eq!(input, PathBuf::from(input_raw));
            prop_assert_eq!(output, PathBuf::from(output_raw));

            let failed = ChildResponse::Failed { id: JobId::new(), message: message.clone(), timed_out: false };
            let decoded = ChildResponse::decode(&failed.encode().unwrap()).unwrap();
            match decoded {
                ChildResponse::Failed { message: got, timed_out, .. } => {
                    prop_assert_eq!(got, message);
                    prop_assert!(!timed_out);
                }
                _ => prop_assert!(false, "expected Failed"),
            }
        }
    }
}
