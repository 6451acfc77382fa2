// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CommandTagger`: shells out to an external program per job, for
//! operators running a real tagger binary rather than an in-process Rust
//! implementation (selected via `TAGGER_COMMAND`, see `tagq-server::config`).

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::TaggerError;
use crate::trait_def::Tagger;

/// Runs `<command> <input> <output>` for each job. The external program is
/// responsible for writing its result to `output`; its stdout/stderr are
/// only consulted to build an error message on non-zero exit.
pub struct CommandTagger {
    command: String,
    output_extension: String,
    processing_speed: u64,
}

impl CommandTagger {
    pub fn new(command: impl Into<String>, output_extension: impl Into<String>, processing_speed: u64) -> Self {
        Self { command: command.into(), output_extension: output_extension.into(), processing_speed }
    }
}

#[async_trait]
impl Tagger for CommandTagger {
    fn output_extension(&self) -> &str {
        &self.output_extension
    }

    fn processing_speed(&self) -> u64 {
        self.processing_speed
    }

    async fn initialize(&mut self) -> Result<(), TaggerError> {
        // The external program is re-invoked fresh for every job; there is
        // no persistent state to warm up here.
        Ok(())
    }

    async fn process(&self, input: &Path, output: &Path) -> Result<(), TaggerError> {
        let result = Command::new(&self.command)
            .arg(input)
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TaggerError::io(input, e))?;

        if !result.status.success() {
            let message = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::warn!(command = %self.command, status = %result.status, %message, "tagger command failed");
            return Err(TaggerError::Process { input: input.to_path_buf(), output: output.to_path_buf(), message });
        }
        Ok(())
    }
}
