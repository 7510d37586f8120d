mod client;
mod types;

pub use client::{sanitize_error_body, ApiClient};
pub use types::{
    FinalizeResponse, HistoryResponse, PingResponse, QueueMetrics, QueueStatus, ServerFileRecord,
    UploadResponse,
};
