//! Regular transport: one multipart request for every small file.

use crate::api::ApiClient;
use crate::error::UploaderError;
use tracing::debug;

use super::types::{TaskStatus, UploadTask};

/// Upload every task in `tasks` through a single multipart request.
///
/// On success each task carries its server file id, 100% progress, and
/// status `Uploaded`. On any failure the caller marks the whole batch
/// `error`; no retry is attempted.
pub async fn upload_regular(
    client: &ApiClient,
    tasks: &mut [UploadTask],
) -> Result<(), UploaderError> {
    if tasks.is_empty() {
        return Ok(());
    }

    let file_type = tasks[0].declared_type;
    let mut files = Vec::with_capacity(tasks.len());
    for task in tasks.iter() {
        let bytes = std::fs::read(&task.file_path).map_err(|e| {
            UploaderError::Upload(format!("Failed to read file {}: {}", task.file_name, e))
        })?;
        files.push((task.file_name.clone(), bytes));
    }

    debug!(files = tasks.len(), file_type = %file_type, "Starting regular upload");
    let ids = client.upload_files(files, file_type).await?;

    for (task, id) in tasks.iter_mut().zip(ids) {
        task.server_file_id = Some(id);
        task.progress_percent = 100.0;
        task.advance_status(TaskStatus::Uploaded);
    }

    Ok(())
}
