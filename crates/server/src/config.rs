// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server crate (§6
//! "Environment variables", expanded per SPEC_FULL.md).

use std::path::PathBuf;
use std::time::Duration;

/// Base URL for outbound callbacks; `None` disables callback delivery.
pub fn callback_server() -> Option<String> {
    std::env::var("CALLBACK_SERVER").ok().filter(|s| !s.is_empty())
}

/// Number of warm worker-child processes kept in the pool.
pub fn num_workers() -> usize {
    std::env::var("NUM_WORKERS").ok().and_then(|s| s.parse().ok()).unwrap_or(1)
}

/// Address the HTTP API binds to.
pub fn bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
}

/// Resolve the state directory: `TAGQ_STATE_DIR` > `XDG_STATE_HOME/tagq` >
/// `~/.local/state/tagq` > `./tagq-data`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TAGQ_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("tagq");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/tagq");
    }
    PathBuf::from("./tagq-data")
}

/// External program to shell out to per job; unset selects the built-in
/// stub tagger.
pub fn tagger_command() -> Option<String> {
    std::env::var("TAGGER_COMMAND").ok().filter(|s| !s.is_empty())
}

/// Declared output extension (e.g. `.tsv`) for whichever tagger is active.
pub fn tagger_output_extension() -> String {
    std::env::var("TAGGER_OUTPUT_EXTENSION").unwrap_or_else(|_| ".tsv".to_string())
}

/// Declared throughput in characters per second, used by the timeout
/// formula and reported by `GET /health`.
pub fn tagger_processing_speed() -> u64 {
    std::env::var("TAGGER_PROCESSING_SPEED").ok().and_then(|s| s.parse().ok()).unwrap_or(10_000)
}

/// Advisory-lock acquisition timeout (§4.1 default 5s).
pub fn lock_timeout() -> Duration {
    std::env::var("LOCK_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Supervisor tick interval (§4.3: "≈50ms-1s").
pub fn poll_interval() -> Duration {
    std::env::var("POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(200))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn num_workers_defaults_to_one() {
        std::env::remove_var("NUM_WORKERS");
        assert_eq!(num_workers(), 1);
    }

    #[test]
    #[serial]
    fn bind_addr_defaults_match_the_spec() {
        std::env::remove_var("BIND_ADDR");
        assert_eq!(bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    #[serial]
    fn callback_server_unset_or_empty_disables_callbacks() {
        std::env::remove_var("CALLBACK_SERVER");
        assert_eq!(callback_server(), None);
        std::env::set_var("CALLBACK_SERVER", "");
        assert_eq!(callback_server(), None);
        std::env::remove_var("CALLBACK_SERVER");
    }
}
