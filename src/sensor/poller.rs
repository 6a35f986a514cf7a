//! Background polling loop feeding dashboard snapshots.
//!
//! One task owns the reading source and the history. After each successful
//! read it publishes an immutable `DashboardSnapshot` through a `watch`
//! channel: publishing never blocks, consumers always see the newest
//! snapshot, and snapshots are never reordered.

use crate::sensor::data::{DashboardSnapshot, SensorReading, Severity};
use crate::sensor::history::{ReadingHistory, DEFAULT_HISTORY_CAPACITY};
use crate::sensor::traits::ReadingSource;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, warn};

/// Default polling period, matching a DHT11's minimum sampling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Pause after a failed read before the next tick.
pub const DEFAULT_ERROR_PAUSE: Duration = Duration::from_secs(1);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    pub interval: Duration,
    pub history_capacity: usize,
    pub error_pause: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            error_pause: DEFAULT_ERROR_PAUSE,
        }
    }
}

impl PollerConfig {
    /// Polling period; raised to 1ms when zero.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_error_pause(mut self, pause: Duration) -> Self {
        self.error_pause = pause;
        self
    }
}

/// Spawns the polling task.
pub struct SensorPoller;

impl SensorPoller {
    /// Start polling `source` on a background task.
    pub fn spawn<S: ReadingSource>(source: S, config: PollerConfig) -> PollerHandle {
        let (tx, rx) = watch::channel(DashboardSnapshot::empty(source.thresholds()));
        let stop = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(run(source, config, tx, stop.clone()));
        info!(
            interval_ms = config.interval.as_millis() as u64,
            capacity = config.history_capacity,
            "sensor polling started"
        );

        PollerHandle {
            snapshots: rx,
            stop,
            task: Some(task),
        }
    }
}

/// Owner-side handle of a running poller. Dropping it stops the loop.
pub struct PollerHandle {
    snapshots: watch::Receiver<DashboardSnapshot>,
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// New receiver positioned at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    /// Stream yielding the current snapshot, then every newer one.
    pub fn stream(&self) -> BoxStream<'static, DashboardSnapshot> {
        Box::pin(WatchStream::new(self.snapshots.clone()))
    }

    pub fn latest(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Ask the loop to exit. It performs no further reads and ends within
    /// one polling period.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the loop and wait for the task to end.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("sensor polling task failed: {}", e);
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run<S: ReadingSource>(
    mut source: S,
    config: PollerConfig,
    tx: watch::Sender<DashboardSnapshot>,
    stop: Arc<AtomicBool>,
) {
    let thresholds = source.thresholds();
    let mut history = ReadingHistory::new(config.history_capacity);
    let mut ticks: u64 = 0;
    let mut last_severity: Option<Severity> = None;

    let mut interval = time::interval(config.interval.max(MIN_POLL_INTERVAL));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if stop.load(Ordering::Acquire) {
            break;
        }

        let reading = match source.read() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("sensor read failed, retrying next tick: {}", e);
                time::sleep(config.error_pause).await;
                continue;
            }
        };

        ticks += 1;
        history.push(reading);
        log_transition(last_severity, &reading);
        last_severity = Some(reading.severity);

        let snapshot = DashboardSnapshot {
            ticks,
            latest: Some(reading),
            history: history.to_vec(),
            stats: history.stats(),
            alarm: reading.severity == Severity::Critical,
            thresholds,
        };
        debug!(
            sequence = reading.sequence,
            temperature_c = reading.temperature_c,
            humidity_pct = reading.humidity_pct,
            "published reading"
        );
        tx.send_replace(snapshot);
    }

    info!(ticks, "sensor polling stopped");
}

fn log_transition(previous: Option<Severity>, reading: &SensorReading) {
    if previous == Some(reading.severity) {
        return;
    }
    match reading.severity {
        Severity::Normal if previous.is_some() => {
            info!(temperature_c = reading.temperature_c, "temperature back to normal")
        }
        Severity::Normal => {}
        Severity::Elevated => warn!(temperature_c = reading.temperature_c, "elevated temperature detected"),
        Severity::Critical => error!(temperature_c = reading.temperature_c, "critical temperature, alarm on"),
    }
}
