// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StubTagger`: a drop-in placeholder for a real tagger backend, flagging
//! deployments that never wired one in. Used as the default backend and
//! throughout the test suite.

use std::path::Path;

use async_trait::async_trait;

use crate::error::TaggerError;
use crate::trait_def::Tagger;

const STUB_MESSAGE: &str = "Did you forget to override process.py?";
const DEFAULT_OUTPUT_EXTENSION: &str = ".tsv";
const DEFAULT_PROCESSING_SPEED: u64 = 10_000;

pub struct StubTagger {
    output_extension: String,
    processing_speed: u64,
    initialized: bool,
}

impl StubTagger {
    pub fn new() -> Self {
        Self {
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            processing_speed: DEFAULT_PROCESSING_SPEED,
            initialized: false,
        }
    }

    pub fn with_output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    pub fn with_processing_speed(mut self, speed: u64) -> Self {
        self.processing_speed = speed;
        self
    }
}

impl Default for StubTagger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tagger for StubTagger {
    fn output_extension(&self) -> &str {
        &self.output_extension
    }

    fn processing_speed(&self) -> u64 {
        self.processing_speed
    }

    async fn initialize(&mut self) -> Result<(), TaggerError> {
        self.initialized = true;
        Ok(())
    }

    async fn process(&self, input: &Path, output: &Path) -> Result<(), TaggerError> {
        // The input is never actually inspected: this tagger exists to mark
        // deployments that forgot to wire in a real backend.
        let _ = input;
        tokio::fs::write(output, STUB_MESSAGE)
            .await
            .map_err(|e| TaggerError::io(output, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn process_writes_the_stub_message() {
        let mut tagger = StubTagger::new();
        tagger.initialize().await.unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in.txt");
        let output = tmp.path().join("out.tsv");
        tokio::fs::write(&input, "hello").await.unwrap();

        tagger.process(&input, &output).await.unwrap();

        let written = tokio::fs::read_to_string(&output).await.unwrap();
        assert_eq!(written, STUB_MESSAGE);
    }

    #[test]
    fn defaults_match_the_declared_template_values() {
        let tagger = StubTagger::new();
        assert_eq!(tagger.output_extension(), ".tsv");
        assert_eq!(tagger.processing_speed(), 10_000);
    }
}
