//! Web server configuration.

use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the dashboard web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Whether to enable CORS
    pub enable_cors: bool,
    /// Directory with a custom `index.html` and assets
    pub static_path: Option<String>,
    /// Maximum number of concurrent WebSocket connections
    pub max_websocket_connections: usize,
    /// Celsius applied by the dashboard's heat and cool buttons
    pub control_step_c: f64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: true,
            static_path: None,
            max_websocket_connections: 100,
            control_step_c: crate::sensor::simulator::DEFAULT_STEP_C,
        }
    }
}

impl WebConfig {
    /// Create a new web configuration with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    pub fn with_static_path(mut self, path: Option<String>) -> Self {
        self.static_path = path;
        self
    }

    pub fn with_max_websocket_connections(mut self, max: usize) -> Self {
        self.max_websocket_connections = max;
        self
    }

    pub fn with_control_step(mut self, step_c: f64) -> Self {
        self.control_step_c = step_c.abs();
        self
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.control_step_c.is_finite() {
            return Err(LabError::malformed(format!(
                "control step must be a finite number, got {}",
                self.control_step_c
            )));
        }
        Ok(())
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
