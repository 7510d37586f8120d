//! Instance lock preventing concurrent upload runs against one folder.
//!
//! The lock is an advisory flock on `uploader.lock` plus JSON metadata
//! (pid, hostname, start time) so a blocked run can report who holds it.
//! Metadata older than the stale threshold belongs to a crashed run and
//! is replaced.

use crate::error::UploaderError;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use tracing::warn;

/// Consider leftover lock metadata stale after 30 minutes.
pub const LOCK_STALE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub hostname: String,
    pub started_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn is_stale(&self, stale_minutes: i64) -> bool {
        Utc::now() - self.started_at >= chrono::Duration::minutes(stale_minutes)
    }
}

pub struct InstanceLock {
    lock_path: PathBuf,
    hostname: String,
    file: Option<File>,
}

impl InstanceLock {
    pub fn new(lock_path: PathBuf) -> Self {
        Self {
            lock_path,
            hostname: local_hostname(),
            file: None,
        }
    }

    /// Acquire the lock or fail with a message naming the current holder.
    pub fn acquire(&mut self) -> Result<(), UploaderError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;

        if file.try_lock_exclusive().is_err() {
            let holder = read_lock_info(&mut file)
                .map(|info| format!("pid {} on {}", info.pid, info.hostname))
                .unwrap_or_else(|| "another process".to_string());
            return Err(UploaderError::Lock(format!(
                "Another upload is already running ({})",
                holder
            )));
        }

        // We hold the flock, so any metadata on disk is from a run that
        // never released cleanly.
        if let Some(info) = read_lock_info(&mut file) {
            if info.is_stale(LOCK_STALE_MINUTES) {
                warn!(
                    pid = info.pid,
                    hostname = %info.hostname,
                    "Replacing stale lock left by a previous run"
                );
            } else {
                warn!(
                    pid = info.pid,
                    hostname = %info.hostname,
                    "Replacing lock left by a crashed run"
                );
            }
        }

        let info = LockInfo {
            pid: std::process::id(),
            hostname: self.hostname.clone(),
            started_at: Utc::now(),
        };
        write_lock_info(&mut file, &info)?;

        self.file = Some(file);
        Ok(())
    }

    /// Release the lock and remove the lock file. Also runs on drop.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = fs2::FileExt::unlock(&file);
            drop(file);
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_lock_info(file: &mut File) -> Option<LockInfo> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut content).ok()?;
    serde_json::from_str(&content).ok()
}

fn write_lock_info(file: &mut File, info: &LockInfo) -> Result<(), UploaderError> {
    let content = serde_json::to_string_pretty(info)?;
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
