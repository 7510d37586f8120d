use crate::config::{self, UploaderConfig, DEFAULT_BATCH_SIZE, DEFAULT_POLLING_INTERVAL_SECS};
use crate::error::UploaderError;
use crate::upload::FileType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MDAS batch file uploader
#[derive(Parser, Debug)]
#[command(name = "mdas-uploader")]
#[command(version)]
#[command(about = "Batch upload merchant-transaction files to the MDAS warehouse", long_about = None)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// MDAS server URL
    #[arg(long, value_name = "URL", global = true)]
    pub url: Option<String>,

    /// API key for authentication
    #[arg(long, value_name = "KEY", global = true)]
    pub key: Option<String>,

    /// Upload folder (contains inbox/, logs/, processed/)
    #[arg(long, value_name = "DIR", global = true)]
    pub folder: Option<PathBuf>,

    /// Number of files per batch
    #[arg(long, value_name = "NUM", global = true)]
    pub batch_size: Option<usize>,

    /// Seconds between server-busy checks
    #[arg(long, value_name = "SECS", global = true)]
    pub polling_interval: Option<u64>,

    /// Declared type for every file in this run
    #[arg(long, value_name = "TYPE", global = true)]
    pub file_type: Option<FileType>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Test server connectivity
    Ping,
    /// Check the server-side upload queue status
    Status,
    /// Batch upload files from the inbox folder
    Upload,
}

/// Effective settings after merging the config file with command-line
/// flags. Flags win over file values, which win over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    pub api_key: Option<String>,
    pub folder: Option<PathBuf>,
    pub batch_size: usize,
    pub polling_interval: u64,
    pub file_type: FileType,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self, UploaderError> {
        // An explicit --config must exist; the implicit one is optional
        let file_config = match &cli.config {
            Some(path) => config::load_config(path)?,
            None => match config::default_config_path() {
                Ok(path) if path.exists() => config::load_config(&path)?,
                _ => UploaderConfig::default(),
            },
        };

        let url = cli
            .url
            .clone()
            .or(file_config.url)
            .ok_or_else(|| {
                UploaderError::Config("--url or a config file with 'url' is required".to_string())
            })?;

        Ok(Self {
            url,
            api_key: cli.key.clone().or(file_config.key),
            folder: cli.folder.clone().or(file_config.folder),
            batch_size: cli
                .batch_size
                .or(file_config.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE)
                .max(1),
            polling_interval: cli
                .polling_interval
                .or(file_config.polling_interval)
                .unwrap_or(DEFAULT_POLLING_INTERVAL_SECS),
            file_type: cli
                .file_type
                .or(file_config.file_type)
                .unwrap_or(FileType::Tddf),
        })
    }

    pub fn require_api_key(&self) -> Result<&str, UploaderError> {
        self.api_key.as_deref().ok_or_else(|| {
            UploaderError::Config("--key or a config file with 'key' is required".to_string())
        })
    }

    pub fn require_folder(&self) -> Result<&PathBuf, UploaderError> {
        self.folder.as_ref().ok_or_else(|| {
            UploaderError::Config(
                "--folder or a config file with 'folder' is required for upload".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cli_with(config: Option<PathBuf>) -> Cli {
        Cli {
            config,
            url: None,
            key: None,
            folder: None,
            batch_size: None,
            polling_interval: None,
            file_type: None,
            action: Action::Ping,
        }
    }

    #[test]
    fn test_resolve_requires_url() {
        let result = Settings::resolve(&cli_with(None));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("url"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"url": "https://file.example.com", "key": "file-key", "batchSize": 3}"#,
        )
        .unwrap();

        let mut cli = cli_with(Some(config_path));
        cli.url = Some("https://flag.example.com".to_string());

        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.url, "https://flag.example.com");
        assert_eq!(settings.api_key.as_deref(), Some("file-key"));
        assert_eq!(settings.batch_size, 3);
        assert_eq!(settings.polling_interval, DEFAULT_POLLING_INTERVAL_SECS);
        assert_eq!(settings.file_type, FileType::Tddf);
    }

    #[test]
    fn test_require_helpers() {
        let settings = Settings {
            url: "https://mdas.example.com".to_string(),
            api_key: None,
            folder: None,
            batch_size: DEFAULT_BATCH_SIZE,
            polling_interval: DEFAULT_POLLING_INTERVAL_SECS,
            file_type: FileType::Tddf,
        };
        assert!(settings.require_api_key().is_err());
        assert!(settings.require_folder().is_err());
    }
}
