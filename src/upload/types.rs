//! Type definitions for the upload pipeline.
//!
//! Defines core data structures: UploadTask, TaskStatus, FileType,
//! ChunkEnvelope, and the transport constants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Files larger than this go through the chunked transport (20MB).
/// The boundary is strict: a file of exactly this size is "small".
pub const LARGE_FILE_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Slice size for the chunked transport (10MB).
pub const CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Interval between upload-history polls.
pub const POLL_INTERVAL_SECS: u64 = 2;

/// Declared type of an uploaded file, matching the warehouse's data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    Merchant,
    Transaction,
    Terminal,
    Tddf,
    MerchantRisk,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Merchant => "merchant",
            FileType::Transaction => "transaction",
            FileType::Terminal => "terminal",
            FileType::Tddf => "tddf",
            FileType::MerchantRisk => "merchant-risk",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merchant" => Ok(FileType::Merchant),
            "transaction" => Ok(FileType::Transaction),
            "terminal" => Ok(FileType::Terminal),
            "tddf" => Ok(FileType::Tddf),
            "merchant-risk" => Ok(FileType::MerchantRisk),
            other => Err(format!(
                "Unknown file type '{}' (expected merchant, transaction, terminal, tddf, or merchant-risk)",
                other
            )),
        }
    }
}

/// Client-side processing state of an upload task.
///
/// The sequence is uploading -> uploaded -> (queued -> processing)? ->
/// completed | error. A displayed status never moves backward except to
/// `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Uploading,
    Uploaded,
    Queued,
    Processing,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }

    /// Position in the status sequence, used to reject regressions.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            TaskStatus::Uploading => 0,
            TaskStatus::Uploaded => 1,
            TaskStatus::Queued => 2,
            TaskStatus::Processing => 3,
            TaskStatus::Completed => 4,
            TaskStatus::Error => 5,
        }
    }

    /// Map a server-reported `processing_status` string to the local enum.
    /// Unknown strings return `None` and leave the task unchanged.
    pub fn from_server_status(status: &str) -> Option<TaskStatus> {
        match status {
            "uploading" => Some(TaskStatus::Uploading),
            "uploaded" => Some(TaskStatus::Uploaded),
            "queued" => Some(TaskStatus::Queued),
            "processing" => Some(TaskStatus::Processing),
            "completed" => Some(TaskStatus::Completed),
            "failed" | "error" => Some(TaskStatus::Error),
            _ => None,
        }
    }

    /// Cosmetic progress value the poller displays for an observed status.
    pub fn heuristic_progress(&self) -> Option<f32> {
        match self {
            TaskStatus::Queued => Some(50.0),
            TaskStatus::Processing => Some(75.0),
            TaskStatus::Completed => Some(100.0),
            _ => None,
        }
    }
}

/// One file selected for upload, tracked from selection through the
/// server's terminal processing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTask {
    pub local_id: Uuid,
    pub file_name: String,
    pub file_path: PathBuf,
    pub size_bytes: u64,
    pub declared_type: FileType,
    pub progress_percent: f32,
    pub status: TaskStatus,
    pub server_file_id: Option<i64>,
    pub file_hash: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl UploadTask {
    pub fn new(file_path: PathBuf, file_name: String, size_bytes: u64, declared_type: FileType) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            file_name,
            file_path,
            size_bytes,
            declared_type,
            progress_percent: 0.0,
            status: TaskStatus::Uploading,
            server_file_id: None,
            file_hash: None,
            queued_at: Utc::now(),
            last_error: None,
        }
    }

    pub fn is_large(&self) -> bool {
        self.size_bytes > LARGE_FILE_THRESHOLD
    }

    /// Advance to `next` only if it is further along the status sequence.
    /// `Error` is always applied.
    pub fn advance_status(&mut self, next: TaskStatus) {
        if next == TaskStatus::Error || next.rank() > self.status.rank() {
            self.status = next;
        }
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = TaskStatus::Error;
        self.last_error = Some(message.into());
    }
}

/// One 10MB slice of a large file, existing only for the duration of a
/// single chunk request.
#[derive(Debug, Clone)]
pub struct ChunkEnvelope {
    pub upload_correlation_id: Uuid,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub file_name: String,
    pub declared_type: FileType,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(size_bytes: u64) -> UploadTask {
        UploadTask::new(
            PathBuf::from("/data/inbox/tddf_20260115.TSYSO"),
            "tddf_20260115.TSYSO".to_string(),
            size_bytes,
            FileType::Tddf,
        )
    }

    #[test]
    fn test_file_type_round_trip() {
        for name in ["merchant", "transaction", "terminal", "tddf", "merchant-risk"] {
            let parsed: FileType = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
        }
        assert!("mcc".parse::<FileType>().is_err());
    }

    #[test]
    fn test_large_boundary_is_strict() {
        // Exactly 20MB stays on the regular path
        assert!(!make_task(LARGE_FILE_THRESHOLD).is_large());
        assert!(make_task(LARGE_FILE_THRESHOLD + 1).is_large());
    }

    #[test]
    fn test_status_never_regresses() {
        let mut task = make_task(1024);
        task.advance_status(TaskStatus::Processing);
        assert_eq!(task.status, TaskStatus::Processing);

        // An older status from a stale history snapshot is ignored
        task.advance_status(TaskStatus::Queued);
        assert_eq!(task.status, TaskStatus::Processing);

        task.advance_status(TaskStatus::Completed);
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn test_error_always_applies() {
        let mut task = make_task(1024);
        task.advance_status(TaskStatus::Completed);
        task.advance_status(TaskStatus::Error);
        assert_eq!(task.status, TaskStatus::Error);
    }

    #[test]
    fn test_server_status_mapping() {
        assert_eq!(
            TaskStatus::from_server_status("queued"),
            Some(TaskStatus::Queued)
        );
        assert_eq!(
            TaskStatus::from_server_status("processing"),
            Some(TaskStatus::Processing)
        );
        assert_eq!(
            TaskStatus::from_server_status("completed"),
            Some(TaskStatus::Completed)
        );
        assert_eq!(
            TaskStatus::from_server_status("failed"),
            Some(TaskStatus::Error)
        );
        assert_eq!(TaskStatus::from_server_status("archived"), None);
    }

    #[test]
    fn test_heuristic_progress_values() {
        assert_eq!(TaskStatus::Queued.heuristic_progress(), Some(50.0));
        assert_eq!(TaskStatus::Processing.heuristic_progress(), Some(75.0));
        assert_eq!(TaskStatus::Completed.heuristic_progress(), Some(100.0));
        assert_eq!(TaskStatus::Uploading.heuristic_progress(), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
        assert!(!TaskStatus::Uploaded.is_terminal());
    }
}
