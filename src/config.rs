use crate::error::UploaderError;
use crate::upload::FileType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 10;

pub const INBOX_FOLDER: &str = "inbox";
pub const LOGS_FOLDER: &str = "logs";
pub const PROCESSED_FOLDER: &str = "processed";

/// Settings read from the JSON config file. Every field is optional so
/// command-line flags can fill the gaps; flags win over file values.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploaderConfig {
    pub url: Option<String>,
    pub key: Option<String>,
    pub folder: Option<PathBuf>,
    #[serde(rename = "batchSize")]
    pub batch_size: Option<usize>,
    #[serde(rename = "pollingInterval")]
    pub polling_interval: Option<u64>,
    #[serde(rename = "fileType")]
    pub file_type: Option<FileType>,
}

pub fn default_config_path() -> Result<PathBuf, UploaderError> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| UploaderError::Config("Could not find home directory".to_string()))?;
    Ok(home_dir.join(".mdas-uploader").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<UploaderConfig, UploaderError> {
    if !path.exists() {
        return Err(UploaderError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    let config: UploaderConfig = serde_json::from_str(&content)
        .map_err(|e| UploaderError::Config(format!("Invalid JSON in config file: {}", e)))?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &UploaderConfig) -> Result<(), UploaderError> {
    if let Some(parent) = path.parent() {
        ensure_private_dir(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;

    // Set permissions to 600 (read/write for owner only) on Unix systems
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o600);
        fs::set_permissions(path, permissions)?;
    }

    Ok(())
}

fn ensure_private_dir(dir: &Path) -> Result<(), UploaderError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;

        // Set permissions to 700 (read/write/execute for owner only) on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = fs::metadata(dir)?;
            let mut permissions = metadata.permissions();
            permissions.set_mode(0o700);
            fs::set_permissions(dir, permissions)?;
        }
    }
    Ok(())
}

/// The working folder layout the uploader maintains:
///
/// ```text
/// <folder>/
///   inbox/       files to upload (scanned flat)
///   logs/        log output and upload reports
///   processed/   successfully uploaded files
/// ```
#[derive(Debug, Clone)]
pub struct Folders {
    pub root: PathBuf,
    pub inbox: PathBuf,
    pub logs: PathBuf,
    pub processed: PathBuf,
}

impl Folders {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            inbox: root.join(INBOX_FOLDER),
            logs: root.join(LOGS_FOLDER),
            processed: root.join(PROCESSED_FOLDER),
        }
    }

    /// Create the folder structure if any part of it is missing.
    pub fn ensure(root: &Path) -> Result<Self, UploaderError> {
        let folders = Self::new(root);
        for dir in [
            &folders.root,
            &folders.inbox,
            &folders.logs,
            &folders.processed,
        ] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(folders)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("uploader.lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.json"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_load_config_camel_case_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "url": "https://mdas.example.com",
                "key": "mdas_test_key",
                "folder": "/data/uploads",
                "batchSize": 10,
                "pollingInterval": 30
            }"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.url.as_deref(), Some("https://mdas.example.com"));
        assert_eq!(config.key.as_deref(), Some("mdas_test_key"));
        assert_eq!(config.batch_size, Some(10));
        assert_eq!(config.polling_interval, Some(30));
        assert!(config.file_type.is_none());
    }

    #[test]
    fn test_load_config_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let result = load_config(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_save_and_reload_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = UploaderConfig {
            url: Some("https://mdas.example.com".to_string()),
            key: Some("mdas_key".to_string()),
            ..Default::default()
        };
        save_config(&path, &config).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.url, config.url);
        assert_eq!(loaded.key, config.key);
    }

    #[test]
    fn test_folders_ensure_creates_structure() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("uploads");

        let folders = Folders::ensure(&root).unwrap();
        assert!(folders.inbox.is_dir());
        assert!(folders.logs.is_dir());
        assert!(folders.processed.is_dir());
        assert_eq!(folders.lock_path(), root.join("uploader.lock"));
    }
}
