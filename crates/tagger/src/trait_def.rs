// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tagger adapter contract (§4.3, §6).

use std::path::Path;

use async_trait::async_trait;

use crate::error::TaggerError;

/// A pluggable NLP tagging backend.
///
/// One value is constructed per worker-child process and `initialize()` is
/// called exactly once before the first `process()` call (§4.3 "Global
/// initialized tagger state") — implementations that hold expensive model
/// state (GPU context, loaded weights) do that work in `initialize()`, not
/// in a constructor, so the worker-child can report `ChildResponse::Ready`
/// only once it is actually ready to take jobs.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// File extension (including the leading dot) this tagger appends to
    /// output filenames, e.g. `.tsv`.
    fn output_extension(&self) -> &str;

    /// Declared throughput in characters per second, used by the timeout
    /// formula (§4.3) and reported verbatim by `GET /health` (§6).
    fn processing_speed(&self) -> u64;

    /// One-time setup. Called once per worker-child process lifetime.
    async fn initialize(&mut self) -> Result<(), TaggerError>;

    /// Tag the file at `input` and write the result to `output`.
    async fn process(&self, input: &Path, output: &Path) -> Result<(), TaggerError>;
}
