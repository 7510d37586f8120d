use anyhow::Result;
use clap::Parser;
use mdas_uploader::api::ApiClient;
use mdas_uploader::batch::BatchRunner;
use mdas_uploader::cli::{Action, Cli, Settings};
use mdas_uploader::config::{Folders, LOGS_FOLDER};
use mdas_uploader::logging;
use std::process;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;

    // The upload action logs into <folder>/logs/; ping and status run
    // console-only.
    let logs_dir = match cli.action {
        Action::Upload => settings.folder.as_ref().map(|f| f.join(LOGS_FOLDER)),
        _ => None,
    };
    logging::init_logging(logs_dir.as_deref())?;

    match cli.action {
        Action::Ping => run_ping(&settings).await,
        Action::Status => run_status(&settings).await,
        Action::Upload => run_upload(&settings).await,
    }
}

async fn run_ping(settings: &Settings) -> Result<()> {
    println!("=== MDAS Server Ping ===");
    println!("Server: {}", settings.url);

    let client = ApiClient::new(&settings.url, settings.api_key.clone());
    match client.ping().await {
        Ok(response) => {
            println!("Status: {}", response.status.as_deref().unwrap_or("Unknown"));
            println!(
                "Environment: {}",
                response.environment.as_deref().unwrap_or("Unknown")
            );
            println!(
                "Message: {}",
                response.message.as_deref().unwrap_or("No message")
            );
            println!("Connection successful");
            Ok(())
        }
        Err(e) => {
            eprintln!("Connection failed: {}", e);
            process::exit(1);
        }
    }
}

async fn run_status(settings: &Settings) -> Result<()> {
    settings.require_api_key()?;
    let client = ApiClient::new(&settings.url, settings.api_key.clone());

    match client.queue_status().await {
        Ok(status) => {
            println!("=== Upload Queue Status ===");
            println!("Server: {}", settings.url);
            println!("Queue Metrics:");
            println!("  Active: {}", status.queue.active);
            println!("  Waiting: {}", status.queue.waiting);
            println!("  Completed: {}", status.queue.completed);
            println!("  Failed: {}", status.queue.failed);
            println!("Capacity:");
            match status.max_concurrent {
                Some(max) => println!("  Max Concurrent: {}", max),
                None => println!("  Max Concurrent: Unknown"),
            }
            println!("  Is Busy: {}", status.is_busy);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to get queue status: {}", e);
            process::exit(1);
        }
    }
}

async fn run_upload(settings: &Settings) -> Result<()> {
    settings.require_api_key()?;
    let folder = settings.require_folder()?;
    Folders::ensure(folder)?;

    println!("=== MDAS Batch Upload ===");
    println!("Server: {}", settings.url);
    println!("Folder: {}", folder.display());
    println!("Batch Size: {}", settings.batch_size);
    println!("File Type: {}", settings.file_type);

    let client = ApiClient::new(&settings.url, settings.api_key.clone());
    let mut runner = BatchRunner::new(client, settings.clone());
    let report = runner.run().await?;

    println!("=== Upload Summary ===");
    println!("Total Files: {}", report.total);
    println!("Successful: {}", report.successful);
    println!("Failed: {}", report.failed);
    if report.skipped > 0 {
        println!("Skipped: {}", report.skipped);
    }
    if report.failed > 0 {
        println!("Failed Uploads:");
        for outcome in report.uploads.iter().filter(|u| !u.success) {
            println!(
                "  - {}: {}",
                outcome.file_name,
                outcome.error.as_deref().unwrap_or("Upload failed")
            );
        }
        process::exit(1);
    }

    Ok(())
}
