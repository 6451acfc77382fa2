// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-job timeout formula (§4.3 step 3, §9 open question).
//!
//! `300 + input_bytes + processing_speed` adds a byte count to a char/s
//! rate, which is dimensionally inconsistent. Reproduced verbatim; the
//! fix, per §9, is for operators to set `processing_speed` to a large
//! slack constant rather than for us to "correct" the arithmetic.

use std::time::Duration;

const BASE_SECONDS: u64 = 300;

/// Extra time the parent waits beyond a child's own deadline before
/// declaring it wedged and killing it (the supervisor/OS-kill fallback of
/// §4.3 step 5).
pub const SUPERVISOR_GRACE: Duration = Duration::from_secs(10);

pub fn compute(input_bytes: u64, processing_speed: u64) -> Duration {
    Duration::from_secs(BASE_SECONDS + input_bytes + processing_speed)
}
