//! SHA256 hashing and the uploaded-hash cache.
//!
//! Re-running the uploader against a half-drained inbox must not resend
//! content the server already accepted. Hashes of successfully uploaded
//! files are remembered in a bounded, TTL-limited cache owned by the
//! batch runner.

use crate::error::UploaderError;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

/// Maximum number of uploaded hashes to remember (prevents unbounded
/// memory growth; each hash is ~64 bytes).
pub const MAX_UPLOADED_HASHES: usize = 10_000;

/// Default lifetime of a cache entry.
pub const DEFAULT_HASH_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Calculate the SHA256 hash of a file's content.
pub fn file_sha256(file_path: &Path) -> Result<String, UploaderError> {
    let mut file = File::open(file_path)?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Calculate the SHA256 hash of in-memory content.
pub fn content_sha256(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Insertion-ordered hash cache with injected capacity and TTL.
///
/// Entries past their TTL count as absent; when the cache overflows its
/// capacity the oldest entries are pruned first.
#[derive(Debug)]
pub struct UploadedHashCache {
    entries: IndexMap<String, Instant>,
    capacity: usize,
    ttl: Duration,
}

impl UploadedHashCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity,
            ttl,
        }
    }

    pub fn insert(&mut self, hash: String) {
        self.entries.insert(hash, Instant::now());

        if self.entries.len() > self.capacity {
            let remove_count = self.entries.len() - self.capacity;
            for _ in 0..remove_count {
                self.entries.shift_remove_index(0);
            }
        }
    }

    pub fn contains(&mut self, hash: &str) -> bool {
        match self.entries.get(hash) {
            Some(inserted_at) if inserted_at.elapsed() < self.ttl => true,
            Some(_) => {
                // Expired; drop it so the file can be uploaded again
                self.entries.shift_remove(hash);
                false
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for UploadedHashCache {
    fn default() -> Self {
        Self::new(MAX_UPLOADED_HASHES, DEFAULT_HASH_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_sha256_matches_content_hash() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"merchant,1234,100.00").unwrap();
        temp_file.flush().unwrap();

        let from_file = file_sha256(temp_file.path()).unwrap();
        let from_content = content_sha256(b"merchant,1234,100.00");

        assert_eq!(from_file, from_content);
        assert_eq!(from_file.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(content_sha256(b"content1"), content_sha256(b"content2"));
    }

    #[test]
    fn test_cache_remembers_within_ttl() {
        let mut cache = UploadedHashCache::new(10, Duration::from_secs(60));
        let hash = content_sha256(b"abc");

        assert!(!cache.contains(&hash));
        cache.insert(hash.clone());
        assert!(cache.contains(&hash));
    }

    #[test]
    fn test_cache_expires_entries() {
        let mut cache = UploadedHashCache::new(10, Duration::ZERO);
        let hash = content_sha256(b"abc");

        cache.insert(hash.clone());
        // TTL of zero: the entry is expired by the time it is read back
        assert!(!cache.contains(&hash));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_prunes_oldest_beyond_capacity() {
        let mut cache = UploadedHashCache::new(3, Duration::from_secs(60));
        for i in 0..5 {
            cache.insert(format!("hash-{}", i));
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("hash-0"));
        assert!(!cache.contains("hash-1"));
        assert!(cache.contains("hash-2"));
        assert!(cache.contains("hash-4"));
    }
}
