//! Main server integration for checkflow

use crate::app::Checkflow;
use crate::models::Configuration;
use crate::server::api::{create_api_routes, AppState};
use anyhow::{Context, Result};
use std::net::SocketAddr;

/// HTTP server exposing the engine and the directory
pub struct CheckflowServer {
    host: String,
    port: u16,
    state: AppState,
}

impl CheckflowServer {
    pub fn new(host: String, port: u16, app: Checkflow) -> Self {
        Self {
            host,
            port,
            state: AppState::new(app),
        }
    }

    /// Open the configured store and prepare a server for it
    pub fn from_config(config: &Configuration) -> Result<Self> {
        let app = Checkflow::open(config).with_context(|| {
            format!(
                "Failed to open workflow store at {}",
                config.store_path.display()
            )
        })?;
        Ok(Self::new(config.server_host.clone(), config.server_port, app))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let address: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .context("Invalid server address")?;

        let routes = create_api_routes(self.state);
        let (bound, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(address, async {
                let _ = tokio::signal::ctrl_c().await;
                println!("\n🛑 Shutting down server...");
            })
            .context(format!("Failed to bind to {}", address))?;

        println!("🚀 checkflow server listening on http://{}", bound);
        println!("Press Ctrl+C to stop the server");
        tracing::info!(address = %bound, "HTTP API started");

        server.await;
        Ok(())
    }
}
