//! Wire types for the MDAS upload API.

use serde::Deserialize;

/// One created upload in a regular-upload response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadCreated {
    pub id: i64,
}

/// Response body of `POST /api/uploads`.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub uploads: Vec<UploadCreated>,
}

/// Response body of `POST /api/uploads/chunked/finalize`.
#[derive(Debug, Deserialize)]
pub struct FinalizeResponse {
    #[serde(rename = "fileId")]
    pub file_id: i64,
}

/// Snapshot of a server-side upload record, owned by the backend and read
/// via history polling.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerFileRecord {
    pub id: i64,
    pub processing_status: String,
    #[serde(default)]
    pub raw_lines_count: Option<u64>,
}

/// Response body of `GET /api/uploads/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub uploads: Vec<ServerFileRecord>,
}

/// Response body of `GET /api/uploads/ping`.
#[derive(Debug, Deserialize)]
pub struct PingResponse {
    pub status: Option<String>,
    pub environment: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueMetrics {
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub waiting: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
}

/// Response body of `GET /api/uploads/status`.
#[derive(Debug, Deserialize)]
pub struct QueueStatus {
    #[serde(default)]
    pub queue: QueueMetrics,
    #[serde(rename = "maxConcurrent")]
    pub max_concurrent: Option<u64>,
    #[serde(rename = "isBusy", default)]
    pub is_busy: bool,
}
