use crate::error::UploaderError;
use std::path::Path;

/// File extensions the warehouse accepts. `.TSYSO` files come from the
/// payment network with the extension upper-cased, so matching is
/// case-insensitive.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "txt", "tsyso"];

/// Whether a path carries an accepted upload extension.
pub fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Validate a file selected for upload: it must exist, be a regular file,
/// carry an accepted extension, and be non-empty. Returns its size.
pub fn validate_upload_file(path: &Path) -> Result<u64, UploaderError> {
    if !has_accepted_extension(path) {
        return Err(UploaderError::Validation(format!(
            "Unsupported file extension: {}",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(path).map_err(|e| {
        UploaderError::Validation(format!(
            "Failed to get file metadata for '{}': {}",
            path.display(),
            e
        ))
    })?;

    if !metadata.is_file() {
        return Err(UploaderError::Validation(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }

    let size = metadata.len();
    if size == 0 {
        return Err(UploaderError::Validation(format!(
            "File is empty: {}",
            path.display()
        )));
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_accepted_extensions_case_insensitive() {
        assert!(has_accepted_extension(Path::new("batch.csv")));
        assert!(has_accepted_extension(Path::new("notes.TXT")));
        assert!(has_accepted_extension(Path::new("daily.TSYSO")));
        assert!(has_accepted_extension(Path::new("daily.tsyso")));
    }

    #[test]
    fn test_rejected_extensions() {
        assert!(!has_accepted_extension(Path::new("archive.zip")));
        assert!(!has_accepted_extension(Path::new("report.pdf")));
        assert!(!has_accepted_extension(Path::new("no_extension")));
        assert!(!has_accepted_extension(Path::new(".csv")));
    }

    #[test]
    fn test_validate_upload_file_ok() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tddf_daily.TSYSO");
        fs::write(&path, "0100ACME MERCHANT").unwrap();

        let size = validate_upload_file(&path).unwrap();
        assert_eq!(size, 17);
    }

    #[test]
    fn test_validate_upload_file_rejects_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();

        let result = validate_upload_file(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_upload_file_rejects_missing() {
        let result = validate_upload_file(&PathBuf::from("/nonexistent/batch.csv"));
        assert!(result.is_err());
    }
}
