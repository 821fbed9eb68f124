//! HTTP server setup.
//!
//! # Responsibilities
//! - Assemble the pipeline from config and collaborators
//! - Serve it with peer addresses attached to every request
//! - Run the rate-limit janitor alongside the listener
//! - Drain in-flight requests on shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::collaborators::CollaboratorRegistry;
use crate::config::GatewayConfig;
use crate::http::pipeline::Pipeline;
use crate::security::RateLimiter;

/// HTTP server for the gateway.
pub struct GatewayServer {
    pipeline: Pipeline,
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, registry: CollaboratorRegistry) -> Self {
        let pipeline = Pipeline::assemble(&config, registry);
        Self { pipeline, config }
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        self.pipeline.rate_limiter()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit_max = self.config.rate_limit.max_requests,
            rate_limit_window_secs = self.config.rate_limit.window_secs,
            "HTTP server starting"
        );

        let janitor = tokio::spawn(self.pipeline.rate_limiter().run_janitor(shutdown.resubscribe()));

        let app = self
            .pipeline
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        janitor.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
