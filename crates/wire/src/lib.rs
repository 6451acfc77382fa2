// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tagq-wire: the newline-delimited JSON protocol spoken between the
//! Worker Supervisor (the parent, see `tagq-engine::pool`) and a worker-child
//! process (§9 "Re-architecting ... Global initialized tagger state").
//!
//! One line of JSON per message, in both directions. The parent never sends
//! a second `Process` request to a child before receiving that child's
//! response to the first — this is what keeps "at most one busy job per
//! worker slot" (I3) true without extra bookkeeping on either side.

mod protocol;

pub use protocol::{ChildRequest, ChildResponse, WireError};
