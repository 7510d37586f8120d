//! HTTP client for the MDAS upload API.
//!
//! Wraps the upload, history, ping, and queue-status endpoints behind one
//! `ApiClient`, with the `X-API-Key` header attached when configured.

use crate::error::UploaderError;
use crate::upload::{ChunkEnvelope, FileType};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use uuid::Uuid;

use super::types::{
    FinalizeResponse, HistoryResponse, PingResponse, QueueStatus, ServerFileRecord, UploadResponse,
};

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(ref key) = self.api_key {
            builder = builder.header("X-API-Key", key);
        }
        builder
    }

    /// `GET /api/uploads/ping` - connectivity and authentication probe.
    pub async fn ping(&self) -> Result<PingResponse, UploaderError> {
        let response = self
            .request(Method::GET, "/api/uploads/ping")
            .send()
            .await
            .map_err(|e| UploaderError::Upload(format!("Ping request failed: {}", e)))?;
        let response = check_status(response, "Ping").await?;

        response
            .json()
            .await
            .map_err(|e| UploaderError::Upload(format!("Failed to parse ping response: {}", e)))
    }

    /// `GET /api/uploads/status` - server-side upload queue metrics.
    pub async fn queue_status(&self) -> Result<QueueStatus, UploaderError> {
        let response = self
            .request(Method::GET, "/api/uploads/status")
            .send()
            .await
            .map_err(|e| UploaderError::Upload(format!("Status request failed: {}", e)))?;
        let response = check_status(response, "Status").await?;

        response
            .json()
            .await
            .map_err(|e| UploaderError::Upload(format!("Failed to parse status response: {}", e)))
    }

    /// `POST /api/uploads` - one multipart request carrying every small
    /// file plus the declared type tag. Returns the created file ids in
    /// request order.
    pub async fn upload_files(
        &self,
        files: Vec<(String, Vec<u8>)>,
        file_type: FileType,
    ) -> Result<Vec<i64>, UploaderError> {
        let expected = files.len();
        let mut form = Form::new().text("type", file_type.as_str());
        for (file_name, bytes) in files {
            form = form.part("files[]", Part::bytes(bytes).file_name(file_name));
        }

        let response = self
            .request(Method::POST, "/api/uploads")
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploaderError::Upload(format!("Upload request failed: {}", e)))?;
        let response = check_status(response, "Upload").await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploaderError::Upload(format!("Failed to parse upload response: {}", e)))?;

        if body.uploads.len() != expected {
            return Err(UploaderError::Upload(format!(
                "Server returned {} upload ids for {} files",
                body.uploads.len(),
                expected
            )));
        }

        Ok(body.uploads.into_iter().map(|u| u.id).collect())
    }

    /// `POST /api/uploads/chunked` - one slice of a large file.
    pub async fn upload_chunk(&self, envelope: ChunkEnvelope) -> Result<(), UploaderError> {
        let form = Form::new()
            .part(
                "chunk",
                Part::bytes(envelope.payload).file_name(envelope.file_name.clone()),
            )
            .text("uploadId", envelope.upload_correlation_id.to_string())
            .text("chunkIndex", envelope.chunk_index.to_string())
            .text("totalChunks", envelope.total_chunks.to_string())
            .text("fileName", envelope.file_name.clone())
            .text("fileType", envelope.declared_type.as_str());

        let response = self
            .request(Method::POST, "/api/uploads/chunked")
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                UploaderError::Upload(format!(
                    "Chunk {}/{} request failed: {}",
                    envelope.chunk_index + 1,
                    envelope.total_chunks,
                    e
                ))
            })?;
        check_status(response, "Chunk upload").await?;

        Ok(())
    }

    /// `POST /api/uploads/chunked/finalize` - assemble the received chunks
    /// into one server-side file. Returns the created file id.
    pub async fn finalize_chunked(
        &self,
        upload_correlation_id: Uuid,
        file_name: &str,
        file_type: FileType,
    ) -> Result<i64, UploaderError> {
        let payload = serde_json::json!({
            "uploadId": upload_correlation_id.to_string(),
            "fileName": file_name,
            "fileType": file_type.as_str(),
        });

        let response = self
            .request(Method::POST, "/api/uploads/chunked/finalize")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| UploaderError::Upload(format!("Finalize request failed: {}", e)))?;
        let response = check_status(response, "Finalize").await?;

        let body: FinalizeResponse = response.json().await.map_err(|e| {
            UploaderError::Upload(format!("Failed to parse finalize response: {}", e))
        })?;

        Ok(body.file_id)
    }

    /// `GET /api/uploads/history` - snapshots of server-side upload records.
    pub async fn history(&self) -> Result<Vec<ServerFileRecord>, UploaderError> {
        let response = self
            .request(Method::GET, "/api/uploads/history")
            .send()
            .await
            .map_err(|e| UploaderError::Upload(format!("History request failed: {}", e)))?;
        let response = check_status(response, "History").await?;

        let body: HistoryResponse = response.json().await.map_err(|e| {
            UploaderError::Upload(format!("Failed to parse history response: {}", e))
        })?;

        Ok(body.uploads)
    }
}

/// Turn a non-2xx response into an `Upload` error, sanitizing HTML error
/// pages down to a generic message.
async fn check_status(response: Response, operation: &str) -> Result<Response, UploaderError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(UploaderError::Upload(format!(
        "{} failed with status {}: {}",
        operation,
        status,
        sanitize_error_body(&body)
    )))
}

/// Error bodies are sometimes HTML error pages rather than JSON; detect
/// them and report a generic server error instead of raw markup.
pub fn sanitize_error_body(body: &str) -> String {
    if body.contains("<!DOCTYPE html>") {
        "server error (HTML response)".to_string()
    } else {
        body.trim().to_string()
    }
}
