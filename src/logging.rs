use crate::error::UploaderError;
use std::path::Path;
use std::sync::{LazyLock, Mutex};
use tracing_subscriber::{
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const LOG_FILE_NAME: &str = "mdas-uploader.log";

static LOGGER_INITIALIZED: std::sync::Once = std::sync::Once::new();

// Keep the guard alive for the lifetime of the program
static FILE_APPENDER_GUARD: LazyLock<Mutex<Option<tracing_appender::non_blocking::WorkerGuard>>> =
    LazyLock::new(|| Mutex::new(None));

/// Initialize the tracing subscriber with a compact console layer and,
/// when a logs directory is available, a non-blocking file layer writing
/// to `mdas-uploader.log`.
///
/// The `ping` and `status` actions run without a folder, so the file
/// layer is optional.
pub fn init_logging(logs_dir: Option<&Path>) -> Result<(), UploaderError> {
    if let Some(dir) = logs_dir {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }

    LOGGER_INITIALIZED.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Console logging - compact format
        let console_layer = fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_filter(env_filter);

        let file_layer = logs_dir.map(|dir| {
            let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Store the guard to keep the writer alive
            if let Ok(mut guard_mutex) = FILE_APPENDER_GUARD.lock() {
                *guard_mutex = Some(guard);
            }

            let file_filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_filter(file_filter)
        });

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .init();
    });

    Ok(())
}
