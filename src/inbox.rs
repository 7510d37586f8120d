//! Inbox folder management.
//!
//! Files to upload are scanned from `inbox/` (flat, no recursion). A file
//! being uploaded is claimed by renaming it with a `.uploading` suffix so
//! it disappears from subsequent scans; successful files move to
//! `processed/` under a collision-free name, failures are unclaimed back.

use crate::error::UploaderError;
use crate::validation::has_accepted_extension;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const UPLOADING_EXTENSION: &str = "uploading";

/// List upload candidates in the inbox: regular files with an accepted
/// extension, sorted by name for a stable upload order.
pub fn scan_inbox(inbox: &Path) -> Result<Vec<PathBuf>, UploaderError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(inbox)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && has_accepted_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Rename orphaned `.uploading` files back to their inbox names. Safe
/// because the caller holds the instance lock: no other uploader can own
/// a claim right now.
pub fn recover_claimed(inbox: &Path) -> Result<usize, UploaderError> {
    let mut recovered = 0;
    for entry in std::fs::read_dir(inbox)? {
        let entry = entry?;
        let path = entry.path();
        let is_claimed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == UPLOADING_EXTENSION)
            .unwrap_or(false);
        if path.is_file() && is_claimed {
            match unclaim_file(&path) {
                Ok(restored) => {
                    info!(file = %restored.display(), "Recovered orphaned claim");
                    recovered += 1;
                }
                Err(e) => warn!(file = %path.display(), error = %e, "Failed to recover claim"),
            }
        }
    }
    Ok(recovered)
}

/// Claim a file by renaming it to `<name>.uploading`. Returns the claimed
/// path.
pub fn claim_file(path: &Path) -> Result<PathBuf, UploaderError> {
    let mut file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| UploaderError::Validation(format!("Invalid file name: {}", path.display())))?
        .to_string();
    file_name.push('.');
    file_name.push_str(UPLOADING_EXTENSION);

    let claimed = path.with_file_name(file_name);
    std::fs::rename(path, &claimed)?;
    Ok(claimed)
}

/// Undo a claim, restoring the original inbox name.
pub fn unclaim_file(claimed: &Path) -> Result<PathBuf, UploaderError> {
    let file_name = claimed
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            UploaderError::Validation(format!("Invalid file name: {}", claimed.display()))
        })?;

    let original_name = file_name
        .strip_suffix(&format!(".{}", UPLOADING_EXTENSION))
        .ok_or_else(|| {
            UploaderError::Validation(format!("Not a claimed file: {}", claimed.display()))
        })?;

    let original = claimed.with_file_name(original_name);
    std::fs::rename(claimed, &original)?;
    Ok(original)
}

/// Pick a destination path in `dir` for `file_name`, appending ` (1)`,
/// ` (2)`, ... before the extension on collision.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), Some(ext.to_string())),
        None => (file_name.to_string(), None),
    };

    let mut counter = 1;
    loop {
        let numbered = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        let candidate = dir.join(numbered);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Move a claimed file into the processed folder under its original name
/// (or a numbered variant on collision). Returns the destination.
pub fn move_to_processed(
    claimed: &Path,
    original_name: &str,
    processed_dir: &Path,
) -> Result<PathBuf, UploaderError> {
    let destination = unique_destination(processed_dir, original_name);
    std::fs::rename(claimed, &destination)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_inbox_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_batch.csv"), "data").unwrap();
        fs::write(dir.path().join("a_daily.TSYSO"), "data").unwrap();
        fs::write(dir.path().join("skip.zip"), "data").unwrap();
        fs::write(dir.path().join("claimed.csv.uploading"), "data").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = scan_inbox(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a_daily.TSYSO", "b_batch.csv"]);
    }

    #[test]
    fn test_claim_and_unclaim_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        fs::write(&path, "data").unwrap();

        let claimed = claim_file(&path).unwrap();
        assert!(!path.exists());
        assert!(claimed.exists());
        assert_eq!(
            claimed.file_name().unwrap().to_str().unwrap(),
            "batch.csv.uploading"
        );

        let restored = unclaim_file(&claimed).unwrap();
        assert_eq!(restored, path);
        assert!(path.exists());
    }

    #[test]
    fn test_recover_claimed_restores_orphans() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("orphan.csv.uploading"), "data").unwrap();
        fs::write(dir.path().join("normal.csv"), "data").unwrap();

        let recovered = recover_claimed(dir.path()).unwrap();
        assert_eq!(recovered, 1);
        assert!(dir.path().join("orphan.csv").exists());
        assert!(!dir.path().join("orphan.csv.uploading").exists());
    }

    #[test]
    fn test_unique_destination_appends_counter() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("batch.csv"), "first").unwrap();
        fs::write(dir.path().join("batch (1).csv"), "second").unwrap();

        let destination = unique_destination(dir.path(), "batch.csv");
        assert_eq!(
            destination.file_name().unwrap().to_str().unwrap(),
            "batch (2).csv"
        );

        let fresh = unique_destination(dir.path(), "other.csv");
        assert_eq!(fresh.file_name().unwrap().to_str().unwrap(), "other.csv");
    }

    #[test]
    fn test_move_to_processed_uses_original_name() {
        let dir = tempdir().unwrap();
        let processed = dir.path().join("processed");
        fs::create_dir(&processed).unwrap();

        let path = dir.path().join("batch.csv");
        fs::write(&path, "data").unwrap();
        let claimed = claim_file(&path).unwrap();

        let destination = move_to_processed(&claimed, "batch.csv", &processed).unwrap();
        assert_eq!(destination, processed.join("batch.csv"));
        assert!(destination.exists());
        assert!(!claimed.exists());
    }
}
