//! Chunked transport for large files.
//!
//! Splits a file into fixed-size slices, sends them strictly in index
//! order tagged with an upload correlation id, then finalizes. A failed
//! chunk aborts the whole file; already-sent chunks are the server's
//! problem and no finalize is issued.

use crate::api::ApiClient;
use crate::error::UploaderError;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use super::types::{ChunkEnvelope, TaskStatus, UploadTask, CHUNK_SIZE};

/// Number of slices needed to cover `size_bytes` at `chunk_size`.
pub fn total_chunks(size_bytes: u64, chunk_size: u64) -> u32 {
    size_bytes.div_ceil(chunk_size) as u32
}

/// Read one slice of a file. The final slice may be shorter than
/// `chunk_size`; reading past the end of the file yields an empty buffer.
pub fn read_chunk(
    file_path: &Path,
    chunk_size: u64,
    chunk_index: u32,
) -> Result<Vec<u8>, UploaderError> {
    let mut file = File::open(file_path)?;
    file.seek(SeekFrom::Start(chunk_index as u64 * chunk_size))?;

    let mut buffer = vec![0u8; chunk_size as usize];
    let mut total_read = 0;
    while total_read < buffer.len() {
        let read = file.read(&mut buffer[total_read..])?;
        if read == 0 {
            break;
        }
        total_read += read;
    }
    buffer.truncate(total_read);
    Ok(buffer)
}

/// Upload one large file through the chunked transport and finalize it.
///
/// Chunks are awaited one at a time in index order. Progress moves to
/// `(index + 1) / total * 100` after each acknowledged slice. On success
/// the task carries the server file id and status `Uploaded`.
pub async fn upload_chunked(
    client: &ApiClient,
    task: &mut UploadTask,
) -> Result<i64, UploaderError> {
    let upload_correlation_id = Uuid::new_v4();
    let total = total_chunks(task.size_bytes, CHUNK_SIZE);

    debug!(
        file = %task.file_name,
        chunks = total,
        upload_id = %upload_correlation_id,
        "Starting chunked upload"
    );

    for chunk_index in 0..total {
        let payload = read_chunk(&task.file_path, CHUNK_SIZE, chunk_index)?;
        let envelope = ChunkEnvelope {
            upload_correlation_id,
            chunk_index,
            total_chunks: total,
            file_name: task.file_name.clone(),
            declared_type: task.declared_type,
            payload,
        };
        client.upload_chunk(envelope).await?;

        task.progress_percent = (chunk_index + 1) as f32 / total as f32 * 100.0;
        debug!(
            file = %task.file_name,
            chunk = chunk_index + 1,
            total = total,
            "Chunk acknowledged"
        );
    }

    let file_id = client
        .finalize_chunked(upload_correlation_id, &task.file_name, task.declared_type)
        .await?;

    task.server_file_id = Some(file_id);
    task.advance_status(TaskStatus::Uploaded);
    Ok(file_id)
}
