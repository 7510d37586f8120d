// Module declarations
mod chunked;
mod dedup;
mod poller;
mod regular;
mod selector;
mod types;

// Re-export types and constants from submodules
pub use types::*;

pub use chunked::{read_chunk, total_chunks, upload_chunked};
pub use dedup::{content_sha256, file_sha256, UploadedHashCache, MAX_UPLOADED_HASHES};
pub use poller::{PollerHandle, StatusPoller};
pub use regular::upload_regular;
pub use selector::{partition_by_size, run_transports};
