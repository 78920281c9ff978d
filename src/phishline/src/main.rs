//! Phishline — phishing-simulation campaign dispatch and tracking engine.
//!
//! Main entry point that wires the stores, dispatcher, and tracking
//! services together and starts the HTTP server.

use clap::Parser;
use phishline_api::{ApiServer, AppState};
use phishline_core::config::AppConfig;
use phishline_core::pages::LoginPageRenderer;
use phishline_dispatch::{Dispatcher, JobRegistry, SmtpMailerFactory};
use phishline_store::{CampaignStore, DirectoryStore, EventStore};
use phishline_tracking::TrackingService;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "phishline")]
#[command(about = "Phishing-simulation campaign dispatch and tracking engine")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "PHISHLINE__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "PHISHLINE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Public base URL for composed tracking links (overrides config)
    #[arg(long, env = "PHISHLINE__TRACKING__PUBLIC_HOST")]
    public_host: Option<String>,

    /// Populate the in-memory directory with demo senders and recipients
    #[arg(long, default_value_t = false)]
    seed_demo: bool,

    /// Skip the Prometheus exporter
    #[arg(long, default_value_t = false)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phishline=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Phishline starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(host) = cli.public_host {
        config.tracking.public_host = host;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        public_host = %config.tracking.public_host,
        "Configuration loaded"
    );

    // Stores
    let directory = Arc::new(DirectoryStore::new());
    let campaigns = Arc::new(CampaignStore::new());
    let events = Arc::new(EventStore::new());
    if cli.seed_demo {
        directory.seed_demo_data();
    }

    // Dispatch pipeline
    let jobs = Arc::new(JobRegistry::new());
    let factory = Arc::new(SmtpMailerFactory::new(config.smtp.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        directory.clone(),
        campaigns.clone(),
        jobs.clone(),
        factory,
        config.smtp.clone(),
        config.tracking.public_host.clone(),
    ));

    // Tracking pipeline
    let tracking = Arc::new(TrackingService::new(
        directory,
        campaigns,
        events,
        LoginPageRenderer::builtin(),
    ));

    let state = AppState {
        dispatcher,
        tracking,
        jobs,
        node_id: config.node_id.clone(),
        start_time: Instant::now(),
    };

    let server = ApiServer::new(config, state);

    if !cli.no_metrics {
        server.start_metrics().await?;
    }

    server.start_http().await
}
