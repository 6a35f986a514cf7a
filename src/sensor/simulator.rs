//! Simulated temperature/humidity sensor.

use crate::error::{LabError, Result};
use crate::sensor::data::{round_one, Range, SensorReading, Severity, Thresholds};
use crate::sensor::traits::ReadingSource;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

/// Default step for heat/cool controls, in Celsius.
pub const DEFAULT_STEP_C: f64 = 5.0;

/// Humidity change per degree of heating.
const HEAT_HUMIDITY_FACTOR: f64 = 0.3;
/// Humidity change per degree of cooling.
const COOL_HUMIDITY_FACTOR: f64 = 0.2;

/// Amplitude of the automatic temperature swing.
const AUTO_AMPLITUDE_C: f64 = 3.0;
/// Divisor applied to elapsed seconds in the automatic swing.
const AUTO_PERIOD_DIVISOR: f64 = 10.0;

/// Static parameters of the simulated sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub base_temperature_c: f64,
    pub base_humidity_pct: f64,
    /// Half-width of the uniform temperature noise
    pub temperature_noise_c: f64,
    /// Half-width of the uniform humidity noise
    pub humidity_noise_pct: f64,
    pub temperature_range: Range,
    pub humidity_range: Range,
    pub thresholds: Thresholds,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            base_temperature_c: 24.0,
            base_humidity_pct: 60.0,
            temperature_noise_c: 0.5,
            humidity_noise_pct: 2.0,
            temperature_range: Range::new(0.0, 50.0),
            humidity_range: Range::new(20.0, 90.0),
            thresholds: Thresholds::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn with_base(mut self, temperature_c: f64, humidity_pct: f64) -> Self {
        self.base_temperature_c = temperature_c;
        self.base_humidity_pct = humidity_pct;
        self
    }

    pub fn with_noise(mut self, temperature_c: f64, humidity_pct: f64) -> Self {
        self.temperature_noise_c = temperature_c.abs();
        self.humidity_noise_pct = humidity_pct.abs();
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Offsets applied on top of the base values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offsets {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    /// When set, the temperature offset follows a slow sine swing
    pub auto: bool,
}

/// Shared handle for changing the simulated environment from outside the
/// polling task.
#[derive(Debug, Clone, Default)]
pub struct SensorControls {
    offsets: Arc<Mutex<Offsets>>,
}

impl SensorControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warm the sensor; humidity drops with heat.
    pub fn heat(&self, step_c: f64) -> Result<Offsets> {
        ensure_finite("heat step", step_c)?;
        self.update(|o| {
            o.temperature_c += step_c;
            o.humidity_pct -= step_c * HEAT_HUMIDITY_FACTOR;
        })
    }

    /// Cool the sensor; humidity rises slightly.
    pub fn cool(&self, step_c: f64) -> Result<Offsets> {
        ensure_finite("cool step", step_c)?;
        self.update(|o| {
            o.temperature_c -= step_c;
            o.humidity_pct += step_c * COOL_HUMIDITY_FACTOR;
        })
    }

    /// Return to ambient conditions. Auto mode is left as is.
    pub fn reset(&self) -> Result<Offsets> {
        self.update(|o| {
            o.temperature_c = 0.0;
            o.humidity_pct = 0.0;
        })
    }

    pub fn set_offsets(&self, temperature_c: f64, humidity_pct: f64) -> Result<Offsets> {
        ensure_finite("temperature offset", temperature_c)?;
        ensure_finite("humidity offset", humidity_pct)?;
        self.update(|o| {
            o.temperature_c = temperature_c;
            o.humidity_pct = humidity_pct;
        })
    }

    pub fn set_auto(&self, enabled: bool) -> Result<Offsets> {
        let offsets = self.update(|o| o.auto = enabled)?;
        info!(enabled, "automatic variation toggled");
        Ok(offsets)
    }

    pub fn current(&self) -> Result<Offsets> {
        self.update(|_| {})
    }

    /// Apply `f` to a copy and commit it only if both offsets stay finite.
    fn update(&self, f: impl FnOnce(&mut Offsets)) -> Result<Offsets> {
        let mut guard = self
            .offsets
            .lock()
            .map_err(|_| LabError::sensor_error("sensor controls lock poisoned"))?;
        let mut next = *guard;
        f(&mut next);
        ensure_finite("temperature offset", next.temperature_c)?;
        ensure_finite("humidity offset", next.humidity_pct)?;
        *guard = next;
        Ok(next)
    }
}

fn ensure_finite(what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LabError::malformed(format!("{} must be a finite number, got {}", what, value)))
    }
}

/// Noisy synthetic sensor driven by `SensorControls`.
pub struct SensorSimulator {
    config: SimulatorConfig,
    controls: SensorControls,
    rng: StdRng,
    started: Instant,
    sequence: u64,
}

impl SensorSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Simulator with a reproducible noise sequence.
    pub fn seeded(config: SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulatorConfig, rng: StdRng) -> Self {
        Self {
            config,
            controls: SensorControls::new(),
            rng,
            started: Instant::now(),
            sequence: 0,
        }
    }

    /// Handle for changing offsets while the simulator is being polled.
    pub fn controls(&self) -> SensorControls {
        self.controls.clone()
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn noise(&mut self, half_width: f64) -> f64 {
        if half_width > 0.0 {
            self.rng.gen_range(-half_width..=half_width)
        } else {
            0.0
        }
    }

    fn auto_offset(&self) -> f64 {
        (self.started.elapsed().as_secs_f64() / AUTO_PERIOD_DIVISOR).sin() * AUTO_AMPLITUDE_C
    }
}

impl ReadingSource for SensorSimulator {
    fn read(&mut self) -> Result<SensorReading> {
        let offsets = self.controls.current()?;
        let temperature_offset = if offsets.auto {
            self.auto_offset()
        } else {
            offsets.temperature_c
        };

        let temperature_noise = self.noise(self.config.temperature_noise_c);
        let humidity_noise = self.noise(self.config.humidity_noise_pct);

        let raw_temperature = self.config.base_temperature_c + temperature_offset + temperature_noise;
        let raw_humidity = self.config.base_humidity_pct + offsets.humidity_pct + humidity_noise;

        // Round first, then clamp, so a rounded value never leaves the range.
        let temperature_c = self.config.temperature_range.clamp(round_one(raw_temperature));
        let humidity_pct = self.config.humidity_range.clamp(round_one(raw_humidity));

        let reading = SensorReading {
            sequence: self.sequence,
            timestamp: Utc::now(),
            temperature_c,
            humidity_pct,
            severity: Severity::classify(temperature_c, &self.config.thresholds),
        };
        self.sequence += 1;
        Ok(reading)
    }

    fn thresholds(&self) -> Thresholds {
        self.config.thresholds
    }
}
