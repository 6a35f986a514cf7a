//! Simulated temperature/humidity sensor and its polling loop.
//!
//! `SensorSimulator` produces noisy readings around configurable base values,
//! `SensorPoller` samples it on a fixed period into a bounded history, and
//! presentation code consumes the resulting `DashboardSnapshot`s.

pub mod data;
pub mod history;
pub mod poller;
pub mod simulator;
pub mod traits;

// Re-export commonly used items
pub use data::{DashboardSnapshot, Range, SensorReading, Severity, TemperatureStats, Thresholds};
pub use history::{ReadingHistory, DEFAULT_HISTORY_CAPACITY};
pub use poller::{PollerConfig, PollerHandle, SensorPoller};
pub use simulator::{Offsets, SensorControls, SensorSimulator, SimulatorConfig};
pub use traits::ReadingSource;
