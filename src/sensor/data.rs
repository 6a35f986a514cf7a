//! Data structures for sensor readings and dashboard snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity band of the latest temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Elevated,
    Critical,
}

impl Severity {
    /// Classify `temperature_c` into half-open bands
    /// `[.., elevated)`, `[elevated, critical)`, `[critical, ..]`.
    pub fn classify(temperature_c: f64, thresholds: &Thresholds) -> Self {
        if temperature_c < thresholds.elevated_c {
            Severity::Normal
        } else if temperature_c < thresholds.critical_c {
            Severity::Elevated
        } else {
            Severity::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Normal => "NORMAL",
            Severity::Elevated => "ELEVATED",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// Temperature thresholds separating the severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Lowest temperature classified as elevated
    pub elevated_c: f64,
    /// Lowest temperature classified as critical
    pub critical_c: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            elevated_c: 25.0,
            critical_c: 30.0,
        }
    }
}

/// Inclusive range a channel is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into the range. Bounds given in reverse order are swapped and
    /// NaN maps to the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        value.max(lo).min(hi)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// One simulated temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Position in the stream of readings, starting at 0
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius, one decimal
    pub temperature_c: f64,
    /// Relative humidity percentage, one decimal
    pub humidity_pct: f64,
    pub severity: Severity,
}

/// Temperature statistics over the retained history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub mean_c: f64,
    pub min_c: f64,
    pub max_c: f64,
}

/// Immutable view handed from the polling task to presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Number of successful reads so far
    pub ticks: u64,
    pub latest: Option<SensorReading>,
    /// Retained readings, oldest first
    pub history: Vec<SensorReading>,
    pub stats: Option<TemperatureStats>,
    /// Buzzer state: on while the latest reading is critical
    pub alarm: bool,
    pub thresholds: Thresholds,
}

impl DashboardSnapshot {
    /// Snapshot before the first reading.
    pub fn empty(thresholds: Thresholds) -> Self {
        Self {
            ticks: 0,
            latest: None,
            history: Vec::new(),
            stats: None,
            alarm: false,
            thresholds,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        self.latest.map(|r| r.severity)
    }

    /// The two 16-character lines of the LCD display.
    pub fn lcd_lines(&self) -> [String; 2] {
        match self.latest {
            Some(r) => [
                format!("Temp: {:4.1}°C", r.temperature_c),
                format!("Hum:  {:4.1}%", r.humidity_pct),
            ],
            None => ["Temp: --.-°C".to_string(), "Hum:  --.-%".to_string()],
        }
    }
}

/// Round to one decimal place.
pub fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
