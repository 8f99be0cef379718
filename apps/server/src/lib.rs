//! # Beacon Server
//!
//! HTTP front end for the broadcast hub: SSE streaming, HTTP publishing, the
//! clock producer and the job tracker, served by `axum-server`.
//!
//! ## Example
//! ```no_run
//! use beacon_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(4583)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod producer;
pub mod router;
mod state;

pub use state::AppState;

use anyhow::{Context, Result};
use axum_server::Handle;
use beacon_hub::Hub;
use beacon_jobs::{JobTracker, TrackerConfig};
use beacon_kernel::domain::config::ApiConfig;
use beacon_kernel::server::{ApiState, hub_config};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Starts the hub and the job tracker and assembles the handler state.
    ///
    /// # Errors
    /// Returns an error if the hub or job settings are invalid (zero capacities,
    /// zero job step or interval).
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn build(self) -> Result<Server> {
        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, "Initializing server");

        let hub = Hub::spawn(hub_config(&self.cfg.hub)).context("Invalid hub settings")?;
        let jobs = JobTracker::with_hub(TrackerConfig::from(&self.cfg.jobs), hub.clone())
            .context("Invalid job settings")?;

        let api = ApiState::builder()
            .config(self.cfg)
            .hub(hub)
            .build()
            .context("Failed to finalize API state")?;
        Ok(Server { state: AppState { api, jobs } })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Serves until a shutdown signal arrives, then drains.
    ///
    /// On shutdown the hub stops first, which ends every open SSE stream, and
    /// the job tracker cancels its running jobs. Remaining connections get
    /// `server.shutdown_grace_secs` to finish.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.api.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        let producer = cfg.producer.enabled.then(|| {
            producer::spawn_clock(
                self.state.api.hub.clone(),
                Duration::from_millis(cfg.producer.interval_ms.max(1)),
            )
        });

        let app = router::init(self.state.clone());

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();
        let state = self.state.clone();
        let grace = Duration::from_secs(cfg.server.shutdown_grace_secs);

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            let detached = state.api.hub.shutdown().await;
            let cancelled = state.jobs.shutdown();
            info!(detached, cancelled, "Hub and job tracker stopped");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        info!("Starting HTTP server on http://{address}");
        axum_server::bind(address)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("HTTP server failed")?;

        if let Some(producer) = producer {
            producer.abort();
        }
        info!("Server shutdown complete");
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
