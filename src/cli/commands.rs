//! CLI command implementations
//!
//! Boot sequence shared by `serve` and `exec`:
//! 1. Load and validate configuration
//! 2. Install tracing
//! 3. Open the commit log and replay it into the store
//! 4. Build identity directory, audit sink and file service

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::api::{ApiError, ApiHandler, Response};
use crate::config::VaultConfig;
use crate::observability::{init_tracing, AuditSink, FileAuditSink, NullAuditSink};
use crate::storage::{FailPoints, LocalCommitLog, Store, StoreOptions, COMMIT_LOG_FILE};
use crate::vault::{FileVault, VaultOptions};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_json, write_json_line};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
        Command::Exec { config } => exec(&config),
    }
}

/// Create the data directory and an empty commit log
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = VaultConfig::load(config_path)?;
    init_tracing(&config.log_level);

    if config.data_dir.join(COMMIT_LOG_FILE).exists() {
        return Err(CliError::already_initialized());
    }
    let log = LocalCommitLog::open(&config.data_dir)?;

    tracing::info!(data_dir = %config.data_dir.display(), "initialized");
    let response = Response::success(
        None,
        serde_json::json!({ "data_dir": config.data_dir, "commit_log": log.path() }),
    );
    write_json(&response.to_json())
}

/// Build the request handler over an initialized data directory
pub fn boot(config: &VaultConfig) -> CliResult<ApiHandler> {
    if !config.data_dir.join(COMMIT_LOG_FILE).exists() {
        return Err(CliError::not_initialized());
    }

    let log = LocalCommitLog::open(&config.data_dir)?;
    let options = StoreOptions::default()
        .with_lock_timeout(config.lock_timeout())
        .with_fail_points(FailPoints::from_env());
    let store = Arc::new(Store::open(Box::new(log), options)?);

    let audit: Arc<dyn AuditSink> = match &config.audit_log {
        Some(path) => Arc::new(FileAuditSink::open(path)?),
        None => Arc::new(NullAuditSink),
    };

    let vault = FileVault::new(store, Arc::new(config.directory()), audit).with_options(VaultOptions {
        max_upload_bytes: config.max_upload_bytes,
    });
    Ok(ApiHandler::new(Arc::new(vault)))
}

/// Execute one request from stdin
pub fn exec(config_path: &Path) -> CliResult<()> {
    let config = VaultConfig::load(config_path)?;
    init_tracing(&config.log_level);
    let handler = boot(&config)?;

    let request = read_request()?;
    write_json(&handler.handle(request.trim()).to_json())
}

/// Serve requests from stdin on a bounded worker pool
///
/// Requests run concurrently, at most `workers` at a time. Responses are
/// written in request order.
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = VaultConfig::load(config_path)?;
    init_tracing(&config.log_level);
    let handler = boot(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    tracing::info!(workers = config.workers, "serving requests from stdin");
    runtime.block_on(serve_loop(handler, config.workers))
}

async fn serve_loop(handler: ApiHandler, workers: usize) -> CliResult<()> {
    let permits = Arc::new(Semaphore::new(workers));
    let (pending_tx, mut pending_rx) = mpsc::channel::<JoinHandle<Response>>(workers * 2);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(task) = pending_rx.recv().await {
            let response = task.await.unwrap_or_else(|e| {
                Response::error(None, &ApiError::invalid_request(format!("request aborted: {}", e)))
            });
            write_json_line(&mut stdout, &response.to_json()).await?;
        }
        Ok::<(), CliError>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CliError::io_error(e.to_string()))?;
        let handler = handler.clone();
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            handler.handle(&line)
        });
        if pending_tx.send(task).await.is_err() {
            break;
        }
    }
    drop(pending_tx);

    writer
        .await
        .map_err(|e| CliError::io_error(format!("response writer failed: {}", e)))??;
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_boot_requires_init() {
        let dir = tempdir().unwrap();
        let config = VaultConfig::new(dir.path().join("data"));
        let err = boot(&config).err().unwrap();
        assert_eq!(err.code_str(), "CLI_NOT_INITIALIZED");

        LocalCommitLog::open(&config.data_dir).unwrap();
        assert!(boot(&config).is_ok());
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("tabvault.json");
        let data_dir = dir.path().join("data");
        std::fs::write(
            &config_path,
            serde_json::json!({ "data_dir": data_dir }).to_string(),
        )
        .unwrap();

        init(&config_path).unwrap();
        assert!(data_dir.join(COMMIT_LOG_FILE).exists());
        let err = init(&config_path).unwrap_err();
        assert_eq!(err.code_str(), "CLI_ALREADY_INITIALIZED");
    }
}
