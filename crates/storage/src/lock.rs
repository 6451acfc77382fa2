// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory exclusive locking on a sidecar `.lock` file (§4.1).
//!
//! A lock file next to the record, acquired with a short retry loop and a
//! bounded timeout rather than blocking forever.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::StoreError;

const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// A held advisory lock. Unlocks and best-effort removes the sidecar file
/// on drop.
pub struct FileLock {
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    /// Acquire an exclusive lock on `path`'s sidecar `.lock` file, retrying
    /// until `timeout` elapses.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let lock_path = sidecar_path(path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::io(lock_path.clone(), e))?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file, lock_path }),
                Err(_) if start.elapsed() >= timeout => return Err(StoreError::LockTimeout(timeout)),
                Err(_) => std::thread::sleep(RETRY_INTERVAL),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.lock_path);
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_on_a_held_lock_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("record");
        let _held = FileLock::acquire(&target, Duration::from_secs(5)).unwrap();

        let err = FileLock::acquire(&target, Duration::from_millis(250)).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(_)));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("record");
        {
            let _held = FileLock::acquire(&target, Duration::from_secs(5)).unwrap();
        }
        // Should not time out now that the first guard has been dropped.
        let _again = FileLock::acquire(&target, Duration::from_millis(250)).unwrap();
    }
}
