//! Web dashboard for the sensor simulator.
//!
//! Serves the latest snapshot over REST, streams every new snapshot over a
//! WebSocket, and exposes the heat/cool/reset/auto controls.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod websocket;

pub use config::WebConfig;
pub use router::create_app;
pub use state::AppState;

use crate::error::{LabError, Result};
use crate::sensor::{DashboardSnapshot, SensorControls};
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::watch;
use tracing::info;

/// Serve the dashboard until `shutdown` resolves.
pub async fn start_web_server<F>(
    config: WebConfig,
    snapshots: watch::Receiver<DashboardSnapshot>,
    controls: SensorControls,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| LabError::config_error(format!("Invalid bind address: {}", e)))?;

    let app = create_app(AppState::new(config, snapshots, controls));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LabError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!("Starting labkit dashboard on http://{}", addr);
    info!("API endpoint: http://{}/api/snapshot", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LabError::web_server_error(format!("Server error: {}", e)))?;

    info!("Dashboard server stopped");
    Ok(())
}
