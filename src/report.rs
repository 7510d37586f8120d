//! JSON upload reports written to the logs folder after each run.

use crate::error::UploaderError;
use crate::upload::{TaskStatus, UploadTask};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub uploads: Vec<FileOutcome>,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "finishedAt")]
    pub finished_at: DateTime<Utc>,
}

impl UploadReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            uploads: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn record_task(&mut self, task: &UploadTask) {
        let success = task.status == TaskStatus::Completed;
        self.total += 1;
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.uploads.push(FileOutcome {
            file_name: task.file_name.clone(),
            success,
            error: if success {
                None
            } else {
                Some(
                    task.last_error
                        .clone()
                        .unwrap_or_else(|| "Upload failed".to_string()),
                )
            },
        });
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Write the report as `upload-report_<unix-timestamp>.json` into the
    /// logs folder. Returns the report path.
    pub fn write(&self, logs_dir: &Path) -> Result<PathBuf, UploaderError> {
        let path = logs_dir.join(format!("upload-report_{}.json", self.finished_at.timestamp()));
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::FileType;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn task_with_status(name: &str, status: TaskStatus) -> UploadTask {
        let mut task = UploadTask::new(
            PathBuf::from(format!("/data/inbox/{}", name)),
            name.to_string(),
            1024,
            FileType::Transaction,
        );
        if status == TaskStatus::Error {
            task.mark_error("Upload failed with status 500");
        } else {
            task.advance_status(status);
        }
        task
    }

    #[test]
    fn test_report_counts_outcomes() {
        let mut report = UploadReport::new(Utc::now());
        report.record_task(&task_with_status("good.csv", TaskStatus::Completed));
        report.record_task(&task_with_status("bad.csv", TaskStatus::Error));
        report.record_skipped();

        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.uploads[1].error.as_deref(), Some("Upload failed with status 500"));
    }

    #[test]
    fn test_report_written_to_logs_folder() {
        let dir = tempdir().unwrap();
        let mut report = UploadReport::new(Utc::now());
        report.record_task(&task_with_status("good.csv", TaskStatus::Completed));
        report.finish();

        let path = report.write(dir.path()).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("upload-report_"));
        assert!(name.ends_with(".json"));

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: UploadReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.successful, 1);
    }
}
