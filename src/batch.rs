//! End-to-end upload run: lock, scan, upload, poll, move, report.

use crate::api::ApiClient;
use crate::cli::Settings;
use crate::config::Folders;
use crate::error::UploaderError;
use crate::inbox;
use crate::lock::InstanceLock;
use crate::report::UploadReport;
use crate::upload::{
    file_sha256, run_transports, StatusPoller, TaskStatus, UploadTask, UploadedHashCache,
};
use crate::validation::validate_upload_file;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Authenticated pings sent while waiting for the server to wake up.
pub const MAX_WAKEUP_ATTEMPTS: u32 = 30;
pub const WAKEUP_INTERVAL_SECS: u64 = 5;

pub struct BatchRunner {
    client: ApiClient,
    settings: Settings,
    uploaded_hashes: UploadedHashCache,
}

impl BatchRunner {
    pub fn new(client: ApiClient, settings: Settings) -> Self {
        Self {
            client,
            settings,
            uploaded_hashes: UploadedHashCache::default(),
        }
    }

    /// Run one batch upload over the inbox folder. Returns the report;
    /// per-file failures are recorded there, not raised.
    pub async fn run(&mut self) -> Result<UploadReport, UploaderError> {
        let folder = self.settings.require_folder()?.clone();
        let folders = Folders::ensure(&folder)?;

        let mut lock = InstanceLock::new(folders.lock_path());
        lock.acquire()?;

        let mut report = UploadReport::new(Utc::now());

        self.wake_server().await?;

        let recovered = inbox::recover_claimed(&folders.inbox)?;
        if recovered > 0 {
            info!(count = recovered, "Recovered claims from a previous run");
        }

        let files = inbox::scan_inbox(&folders.inbox)?;
        if files.is_empty() {
            info!("No files found to upload");
            report.finish();
            report.write(&folders.logs)?;
            return Ok(report);
        }
        info!(count = files.len(), "Found files to upload");

        let tasks = self.prepare_tasks(files, &mut report)?;

        let mut first_batch = true;
        for batch in tasks.chunks(self.settings.batch_size) {
            if !first_batch {
                self.wait_until_idle().await?;
            }
            first_batch = false;

            let settled = self.upload_batch(batch.to_vec()).await;
            for task in &settled {
                self.settle_task(task, &folders, &mut report);
            }
        }

        report.finish();
        let report_path = report.write(&folders.logs)?;
        info!(report = %report_path.display(), "Report saved");

        lock.release();
        Ok(report)
    }

    /// Validate, hash, dedup, and claim the scanned files.
    fn prepare_tasks(
        &mut self,
        files: Vec<PathBuf>,
        report: &mut UploadReport,
    ) -> Result<Vec<UploadTask>, UploaderError> {
        let mut tasks = Vec::with_capacity(files.len());

        for path in files {
            let file_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let size = match validate_upload_file(&path) {
                Ok(size) => size,
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Skipping invalid file");
                    report.record_skipped();
                    continue;
                }
            };

            let file_hash = file_sha256(&path)?;
            if self.uploaded_hashes.contains(&file_hash) {
                info!(file = %file_name, "Skipping duplicate upload (already uploaded)");
                report.record_skipped();
                continue;
            }

            let claimed = inbox::claim_file(&path)?;
            let mut task = UploadTask::new(claimed, file_name, size, self.settings.file_type);
            task.file_hash = Some(file_hash);
            tasks.push(task);
        }

        Ok(tasks)
    }

    /// Upload one batch through the transports, then poll history until
    /// every tracked task is terminal.
    async fn upload_batch(&self, batch: Vec<UploadTask>) -> Vec<UploadTask> {
        let settled = run_transports(&self.client, batch).await;

        let any_tracked = settled.iter().any(|task| task.server_file_id.is_some());
        if !any_tracked {
            return settled;
        }

        let shared = Arc::new(Mutex::new(settled));
        let poller = StatusPoller::new(self.client.clone(), Arc::clone(&shared));
        poller.spawn().wait().await;

        match Arc::try_unwrap(shared) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()),
            Err(shared) => shared
                .lock()
                .map(|tasks| tasks.clone())
                .unwrap_or_default(),
        }
    }

    /// Move a completed file to processed/ and remember its hash; unclaim
    /// anything else so the next run can retry it.
    fn settle_task(&mut self, task: &UploadTask, folders: &Folders, report: &mut UploadReport) {
        report.record_task(task);

        if task.status == TaskStatus::Completed {
            if let Some(hash) = &task.file_hash {
                self.uploaded_hashes.insert(hash.clone());
            }
            match inbox::move_to_processed(&task.file_path, &task.file_name, &folders.processed) {
                Ok(destination) => {
                    info!(file = %task.file_name, to = %destination.display(), "Upload completed")
                }
                Err(e) => warn!(file = %task.file_name, error = %e, "Failed to move processed file"),
            }
        } else {
            warn!(
                file = %task.file_name,
                error = task.last_error.as_deref().unwrap_or("unknown"),
                "Upload failed"
            );
            if let Err(e) = inbox::unclaim_file(&task.file_path) {
                warn!(file = %task.file_name, error = %e, "Failed to unclaim file");
            }
        }
    }

    /// Authenticated pings until the server responds, every 5s for up to
    /// 30 attempts.
    async fn wake_server(&self) -> Result<(), UploaderError> {
        for attempt in 1..=MAX_WAKEUP_ATTEMPTS {
            match self.client.ping().await {
                Ok(_) => {
                    if attempt > 1 {
                        info!(attempts = attempt, "Server is awake");
                    }
                    return Ok(());
                }
                Err(e) => {
                    info!(attempt, max = MAX_WAKEUP_ATTEMPTS, error = %e, "Waiting for server");
                    tokio::time::sleep(Duration::from_secs(WAKEUP_INTERVAL_SECS)).await;
                }
            }
        }
        Err(UploaderError::Upload(format!(
            "Server did not respond after {} wake-up attempts",
            MAX_WAKEUP_ATTEMPTS
        )))
    }

    /// Between batches, wait until the server-side queue reports not busy.
    async fn wait_until_idle(&self) -> Result<(), UploaderError> {
        loop {
            let status = self.client.queue_status().await?;
            if !status.is_busy {
                return Ok(());
            }
            info!(
                active = status.queue.active,
                waiting = status.queue.waiting,
                "Server busy, waiting {}s before next batch",
                self.settings.polling_interval
            );
            tokio::time::sleep(Duration::from_secs(self.settings.polling_interval)).await;
        }
    }
}
