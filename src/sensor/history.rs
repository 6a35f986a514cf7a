//! Fixed-capacity reading history.

use crate::sensor::data::{SensorReading, TemperatureStats};
use std::collections::VecDeque;

/// Default number of retained readings.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Ring buffer of the most recent readings; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct ReadingHistory {
    readings: VecDeque<SensorReading>,
    capacity: usize,
}

impl ReadingHistory {
    /// Create a history holding at most `capacity` readings (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, returning the evicted one when full.
    pub fn push(&mut self, reading: SensorReading) -> Option<SensorReading> {
        let evicted = if self.readings.len() == self.capacity {
            self.readings.pop_front()
        } else {
            None
        };
        self.readings.push_back(reading);
        evicted
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&SensorReading> {
        self.readings.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorReading> {
        self.readings.iter()
    }

    /// Owned copy, oldest first.
    pub fn to_vec(&self) -> Vec<SensorReading> {
        self.readings.iter().copied().collect()
    }

    pub fn stats(&self) -> Option<TemperatureStats> {
        if self.readings.is_empty() {
            return None;
        }

        let (sum, min, max) = self.readings.iter().fold(
            (0.0, f64::INFINITY, f64::NEG_INFINITY),
            |(sum, min, max), r| (sum + r.temperature_c, min.min(r.temperature_c), max.max(r.temperature_c)),
        );

        Some(TemperatureStats {
            mean_c: sum / self.readings.len() as f64,
            min_c: min,
            max_c: max,
        })
    }
}

impl Default for ReadingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
