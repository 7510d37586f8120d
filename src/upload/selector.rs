//! Size-based transport selection.
//!
//! Small files (<= 20MB) are batched into one regular multipart request;
//! large files each go through the chunked transport, strictly one at a
//! time to bound memory and network use.

use crate::api::ApiClient;
use tracing::warn;

use super::chunked::upload_chunked;
use super::regular::upload_regular;
use super::types::UploadTask;

/// Split tasks into the small batch and the large set, preserving order
/// within each.
pub fn partition_by_size(tasks: Vec<UploadTask>) -> (Vec<UploadTask>, Vec<UploadTask>) {
    tasks.into_iter().partition(|task| !task.is_large())
}

/// Run both transports over `tasks` and return them with per-task results
/// applied. Transport failures are terminal: affected tasks are marked
/// `error` and left for the caller to report.
pub async fn run_transports(client: &ApiClient, tasks: Vec<UploadTask>) -> Vec<UploadTask> {
    let (mut small, mut large) = partition_by_size(tasks);

    if !small.is_empty() {
        if let Err(e) = upload_regular(client, &mut small).await {
            let message = e.to_string();
            warn!(files = small.len(), error = %message, "Regular upload failed");
            for task in &mut small {
                task.mark_error(&message);
            }
        }
    }

    // Large files are uploaded sequentially, never concurrently
    for task in &mut large {
        if let Err(e) = upload_chunked(client, task).await {
            let message = e.to_string();
            warn!(file = %task.file_name, error = %message, "Chunked upload failed");
            task.mark_error(message);
        }
    }

    small.extend(large);
    small
}
