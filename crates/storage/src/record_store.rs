// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A generic lock-guarded, one-file-per-id JSON record namespace (§4.1).

use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::lock::FileLock;

pub struct RecordStore<T> {
    dir: PathBuf,
    lock_timeout: Duration,
    _marker: std::marker::PhantomData<T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(dir: PathBuf, lock_timeout: Duration) -> Self {
        Self { dir, lock_timeout, _marker: std::marker::PhantomData }
    }

    fn path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.path(id).is_file()
    }

    /// Replace or create the record for `id`. Writes go through
    /// lock -> truncate-write -> unlock.
    pub fn put(&self, id: &str, record: &T) -> Result<(), StoreError> {
        let path = self.path(id);
        let _lock = FileLock::acquire(&path, self.lock_timeout)?;
        let bytes = serde_json::to_vec(record)?;
        std::fs::write(&path, bytes).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    /// Read the record for `id`. Returns `Ok(None)` for a missing *or*
    /// corrupt record — callers that need an always-present default
    /// synthesize it themselves (the store never crashes a handler, per
    /// §4.1).
    pub fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(id);
        if !path.is_file() {
            return Ok(None);
        }
        let _lock = FileLock::acquire(&path, self.lock_timeout)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding malformed record");
                Ok(None)
            }
        }
    }

    /// Remove the record for `id`, if present. Idempotent.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.path(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// A snapshot of currently persisted ids. May race with concurrent
    /// writers — callers re-check existence on every subsequent read.
    pub fn enumerate(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(self.dir.clone(), e)),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(self.dir.clone(), e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".lock") {
                continue;
            }
            ids.push(name.into_owned());
        }
        Ok(ids)
    }
}
