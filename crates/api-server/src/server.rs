//! API server — mounts the attribution endpoint, auth, and probes, and
//! starts the HTTP and metrics listeners.

use crate::auth;
use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use dealtrace_attribution::AttributionEngine;
use dealtrace_core::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP front for the attribution engine.
pub struct ApiServer {
    config: AppConfig,
    engine: Arc<AttributionEngine>,
}

impl ApiServer {
    pub fn new(config: AppConfig, engine: Arc<AttributionEngine>) -> Self {
        Self { config, engine }
    }

    /// Build the application router.
    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
        };

        Router::new()
            // Attribution endpoint (detail + summary modes)
            .route("/attribution", get(rest::handle_attribution))
            // Auth
            .route("/api/v1/auth/login", post(auth::handle_login))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(axum::middleware::from_fn(auth::auth_middleware))
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP server (blocks until shutdown).
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
