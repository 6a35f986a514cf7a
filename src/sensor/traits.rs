//! Traits for sensor sources.

use crate::error::Result;
use crate::sensor::data::{SensorReading, Thresholds};

/// A source of sensor readings polled by `SensorPoller`.
///
/// Implementations are owned by the polling task; `read` is called once per
/// tick and may fail without stopping the loop.
pub trait ReadingSource: Send + 'static {
    /// Produce the next reading.
    fn read(&mut self) -> Result<SensorReading>;

    /// Thresholds used to classify this source's readings.
    fn thresholds(&self) -> Thresholds {
        Thresholds::default()
    }
}
