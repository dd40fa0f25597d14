//! Polygon parts validation worker.
//!
//! Main entry point that wires the ingestion crates together and runs the
//! job processor until a shutdown signal arrives.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use ingestion_client::http::build_http_client;
use ingestion_client::{HttpCallbackSender, JobManagerClient, JobTrackerClient, PolygonPartsClient};
use ingestion_core::config::AppConfig;
use ingestion_core::error::AppError;
use ingestion_shapefile::ReaderMetrics;
use ingestion_storage::ReportPublisher;
use ingestion_validation::ReportBuilder;
use ingestion_worker::callback::CallbackNotifier;
use ingestion_worker::{IngestionJobHandler, JobExecutor, JobProcessor, JobQueue};

#[tokio::main]
async fn main() {
    let env = std::env::var("INGESTION_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        error!(error = %e, "Worker error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting polygon parts worker");

    // ── Step 1: Required directories ─────────────────────────────
    require_directory("reports root", &config.report.reports_root).await?;
    require_directory("ingestion sources root", &config.ingestion.sources_root).await?;

    // ── Step 2: Service clients ──────────────────────────────────
    let http = build_http_client(config.services.request_timeout_seconds)?;
    let job_store = Arc::new(JobManagerClient::new(
        http.clone(),
        &config.services.job_manager_url,
    ));
    let tracker = Arc::new(JobTrackerClient::new(
        http.clone(),
        &config.services.job_tracker_url,
    ));
    let validation = Arc::new(PolygonPartsClient::new(
        http.clone(),
        &config.services.polygon_parts_url,
    ));
    let callbacks = CallbackNotifier::new(Arc::new(HttpCallbackSender::new(http)));

    // ── Step 3: Report output and publishing ─────────────────────
    let report_builder = Arc::new(ReportBuilder::new(
        &config.report.reports_root,
        config.validation,
    ));
    let publisher = ReportPublisher::from_config(&config.report, &config.storage).await?;
    info!(provider = publisher.provider_type(), "Report storage initialized");

    // ── Step 4: Handlers ─────────────────────────────────────────
    let queue = Arc::new(JobQueue::new(job_store, config.queue.clone()));
    let metrics = Arc::new(ReaderMetrics::new());

    let handler = IngestionJobHandler::new(
        Arc::clone(&queue),
        validation,
        report_builder,
        &config.ingestion,
        config.validation,
    )
    .with_publisher(publisher)
    .with_metrics(metrics.clone());

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(handler));

    // ── Step 5: Processor loop ───────────────────────────────────
    let worker_id = format!(
        "{}-{}",
        config.worker.worker_id_prefix,
        &uuid::Uuid::new_v4().to_string()[..8]
    );
    let processor = JobProcessor::new(
        queue,
        Arc::new(executor),
        tracker,
        callbacks,
        config.worker.clone(),
        worker_id,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, finishing current task...");
        let _ = shutdown_tx.send(true);
    });

    processor.run(shutdown_rx).await;

    let snapshot = metrics.snapshot();
    info!(
        files = snapshot.files_processed,
        chunks = snapshot.chunks_processed,
        features = snapshot.features_processed,
        skipped = snapshot.features_skipped,
        chunk_p95_ms = ?snapshot.chunk_p95_ms,
        "Worker shut down complete"
    );
    Ok(())
}

async fn require_directory(name: &str, path: &str) -> Result<(), AppError> {
    let exists = tokio::fs::metadata(Path::new(path))
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !exists {
        return Err(AppError::configuration(format!(
            "The {name} directory '{path}' does not exist"
        )));
    }
    info!(name, path, "Directory available");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
