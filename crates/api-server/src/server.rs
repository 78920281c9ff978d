//! API server — builds the router and runs the HTTP and metrics listeners.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use phishline_core::config::AppConfig;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Full application router. Exposed for in-process tests.
    pub fn router(state: AppState) -> Router {
        Router::new()
            // Campaign dispatch
            .route("/api/v1/campaigns/send", post(rest::handle_send))
            .route("/api/v1/campaigns/preview", post(rest::handle_preview))
            .route("/api/v1/campaigns/jobs/{job_id}", get(rest::job_status))
            .route(
                "/api/v1/campaigns/jobs/{job_id}/cancel",
                post(rest::cancel_job),
            )
            // Sender verification
            .route("/api/v1/senders/test", post(rest::handle_test_email))
            // Event streams
            .route("/api/v1/events/clicks", get(rest::list_clicks))
            .route("/api/v1/events/credentials", get(rest::list_credentials))
            // Recipient-facing endpoints; paths (with trailing slash) match
            // the composed tracking links exactly
            .route(
                "/track/{recipient_id}/{campaign_id}/{platform}/",
                get(rest::handle_track),
            )
            .route(
                "/login-template/{recipient_id}/{campaign_id}/{platform}/",
                get(rest::handle_login_template),
            )
            .route(
                "/capture/{recipient_id}/{campaign_id}/{platform}/",
                post(rest::handle_capture),
            )
            // Operational
            .route("/health", get(rest::health_check))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP server. Peer addresses are propagated so click and
    /// capture events can record a client ip without a proxy header.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = Self::router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);
        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }

    /// Start the Prometheus exporter on its own port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
