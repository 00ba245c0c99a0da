//! HTTP submission gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ http::server (hyper, one exchange per connection)
//!                                       │
//!                                       ▼
//!                         http::request (limits, client address)
//!                                       │
//!                                       ▼
//!                    submission::Validator ──▶ submission::RequestDispatcher
//!                                                 │            │
//!                                   message::MessageTranslator  observability::MetricsRecorder
//!                                                 │
//!                                                 ▼
//!                                          producer::Producer
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use submission_gateway::admin::{self, AdminState};
use submission_gateway::config::load_config;
use submission_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use submission_gateway::net::{ConnectionRegistry, Listener};
use submission_gateway::observability::{logging, metrics, MetricsManager, MetricsRecorder};
use submission_gateway::producer::LogProducer;
use submission_gateway::SubmissionServer;

const PRODUCER_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "submission-gateway")]
#[command(about = "HTTP document submission gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        namespaces = config.namespaces.len(),
        "submission-gateway starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to install Prometheus exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (producer, producer_task) = LogProducer::open(Path::new(&config.producer.log_path)).await?;
    let manager = Arc::new(MetricsManager::new());
    let registry = ConnectionRegistry::new();
    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let admin_task = if config.admin.enabled {
        let listener = tokio::net::TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(Arc::clone(&manager), registry.clone(), &config.admin.api_key);
        Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    let listener = Listener::bind(&config.listener).await?;
    let server = SubmissionServer::new(
        &config,
        Arc::new(producer),
        MetricsRecorder::new(manager),
        registry,
    );
    server.run(listener, shutdown.subscribe()).await?;

    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
            Ok(Ok(())) => {}
        }
    }

    // The writer finishes once every producer handle is gone.
    if tokio::time::timeout(PRODUCER_FLUSH_TIMEOUT, producer_task).await.is_err() {
        tracing::warn!("Producer did not flush before the deadline");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
