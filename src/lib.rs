//! # labkit
//!
//! Three small services sharing one retry executor and one error model:
//!
//! - **Persona chat**: a character-driven client for a generative-text API,
//!   single-shot or multi-turn, with linear-backoff retry on quota errors
//! - **Postal lookup**: validated postal-code lookups with status
//!   classification, an append-only search history and success statistics
//! - **Sensor simulator**: a temperature/humidity simulator polled on a
//!   fixed interval, with a bounded history and a live web dashboard
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labkit::{start_web_server, PollerConfig, SensorPoller, SensorSimulator, SimulatorConfig, WebConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let simulator = SensorSimulator::new(SimulatorConfig::default());
//!     let controls = simulator.controls();
//!     let poller = SensorPoller::spawn(simulator, PollerConfig::default());
//!
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     start_web_server(WebConfig::default(), poller.subscribe(), controls, shutdown).await?;
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod error;
pub mod postal;
pub mod retry;
pub mod sensor;
pub mod web;

// Re-export public API
pub use chat::{AgentReply, ChatAgent, ChatConfig, GeminiClient, GenerativeBackend, Persona};
pub use error::{ErrorKind, LabError, Result};
pub use postal::{LookupOutcome, LookupStatus, PostalClient, PostalCode, PostalConfig, SearchStats};
pub use retry::{RetryOutcome, RetryPolicy, RetryReport};
pub use sensor::{
    DashboardSnapshot, PollerConfig, PollerHandle, ReadingSource, SensorControls, SensorPoller,
    SensorReading, SensorSimulator, Severity, SimulatorConfig, Thresholds,
};
pub use web::{start_web_server, WebConfig};

/// The default sensor polling interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 2000;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;
