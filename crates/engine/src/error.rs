// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] tagq_storage::StoreError),

    #[error(transparent)]
    Tagger(#[from] tagq_tagger::TaggerError),

    #[error(transparent)]
    Wire(#[from] tagq_wire::WireError),

    #[error("callback request failed: {0}")]
    Callback(#[from] reqwest::Error),

    #[error("worker-child process exited without becoming ready")]
    ChildNotReady,
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
