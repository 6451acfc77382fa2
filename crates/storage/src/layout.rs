// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The managed directory layout (§6 "Filesystem layout").

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// The five directories rooted under the configured state directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub error: PathBuf,
    pub status: PathBuf,
    pub process: PathBuf,
}

impl Layout {
    /// Create (if missing) and return the standard layout under `root`.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let layout = Self {
            input: root.join("input"),
            output: root.join("output"),
            error: root.join("error"),
            status: root.join("status"),
            process: root.join("process"),
            root,
        };
        for dir in [&layout.input, &layout.output, &layout.error, &layout.status, &layout.process]
        {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir.clone(), e))?;
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_path(&self, id: &str) -> PathBuf {
        self.input.join(id)
    }

    pub fn output_path(&self, id: &str, extension: &str) -> PathBuf {
        self.output.join(format!("{id}{extension}"))
    }

    pub fn error_path(&self, id: &str) -> PathBuf {
        self.error.join(id)
    }
}
