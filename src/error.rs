use thiserror::Error;

/// MDAS uploader errors
#[derive(Debug, Error)]
pub enum UploaderError {
    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upload/transport errors
    #[error("Upload error: {0}")]
    Upload(String),

    /// Validation errors (extension, size, etc.)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Instance lock errors
    #[error("Lock error: {0}")]
    Lock(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}
