//! Status poller for server-side processing states.
//!
//! After the transports finish, uploads live on as server records moving
//! through queued -> processing -> completed/failed. The poller reads the
//! shared history endpoint on a fixed interval, applies the observed
//! status to each tracked task, and stops within one tick of the last
//! task reaching a terminal state. Ownership of the timer is explicit: the
//! poller is spawned once and held through a cancellable handle.

use crate::api::{ApiClient, ServerFileRecord};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{TaskStatus, UploadTask, POLL_INTERVAL_SECS};

pub struct StatusPoller {
    client: ApiClient,
    tasks: Arc<Mutex<Vec<UploadTask>>>,
    interval: Duration,
}

/// Handle to a spawned poller. Dropping the handle does not stop the
/// poller; call `stop` for teardown or `wait` to join it.
pub struct PollerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancel the polling loop. The next loop iteration observes the
    /// token and exits without issuing another request.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the poller to finish (all tasks terminal, or stopped).
    pub async fn wait(self) {
        let _ = self.join.await;
    }
}

impl StatusPoller {
    pub fn new(client: ApiClient, tasks: Arc<Mutex<Vec<UploadTask>>>) -> Self {
        Self {
            client,
            tasks,
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
        }
    }

    #[cfg(test)]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn spawn(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Status poller cancelled");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                if all_terminal(&self.tasks) {
                    break;
                }

                match self.client.history().await {
                    Ok(records) => apply_history(&self.tasks, &records),
                    // A failed poll is transient; the next tick retries
                    Err(e) => warn!(error = %e, "History poll failed"),
                }

                if all_terminal(&self.tasks) {
                    debug!("All tracked uploads terminal, stopping poller");
                    break;
                }
            }
        });

        PollerHandle { cancel, join }
    }
}

/// Apply one history snapshot to the tracked tasks. Status moves are
/// monotonic; progress takes the cosmetic heuristic value for the
/// observed status.
pub(crate) fn apply_history(tasks: &Arc<Mutex<Vec<UploadTask>>>, records: &[ServerFileRecord]) {
    let Ok(mut tasks) = tasks.lock() else {
        return;
    };

    for task in tasks.iter_mut() {
        let Some(file_id) = task.server_file_id else {
            continue;
        };
        let Some(record) = records.iter().find(|r| r.id == file_id) else {
            continue;
        };
        let Some(status) = TaskStatus::from_server_status(&record.processing_status) else {
            debug!(
                file = %task.file_name,
                status = %record.processing_status,
                "Ignoring unknown processing status"
            );
            continue;
        };

        let was_terminal = task.status.is_terminal();
        task.advance_status(status);
        if let Some(progress) = task.status.heuristic_progress() {
            task.progress_percent = progress;
        }
        if task.status == TaskStatus::Error && task.last_error.is_none() {
            task.last_error = Some("Server-side processing failed".to_string());
        }
        if !was_terminal && task.status == TaskStatus::Completed {
            debug!(
                file = %task.file_name,
                raw_lines = record.raw_lines_count.unwrap_or(0),
                "Server finished processing"
            );
        }
    }
}

/// Tasks without a server file id never entered the poll set (their
/// transport failed), so they count as settled here.
fn all_terminal(tasks: &Arc<Mutex<Vec<UploadTask>>>) -> bool {
    match tasks.lock() {
        Ok(tasks) => tasks
            .iter()
            .all(|task| task.server_file_id.is_none() || task.status.is_terminal()),
        Err(_) => true,
    }
}
