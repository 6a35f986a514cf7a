//! Shared state for the dashboard handlers.

use crate::sensor::{DashboardSnapshot, SensorControls};
use crate::web::config::WebConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// State handed to every handler through `axum::extract::State`.
#[derive(Clone)]
pub struct AppState {
    pub(crate) snapshots: watch::Receiver<DashboardSnapshot>,
    pub(crate) controls: SensorControls,
    pub(crate) config: Arc<WebConfig>,
    clients: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(
        config: WebConfig,
        snapshots: watch::Receiver<DashboardSnapshot>,
        controls: SensorControls,
    ) -> Self {
        Self {
            snapshots,
            controls,
            config: Arc::new(config),
            clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn latest(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn connected_clients(&self) -> usize {
        self.clients.load(Ordering::Acquire)
    }

    /// Reserve a WebSocket slot, or `None` when the limit is reached.
    pub(crate) fn try_acquire_client(&self) -> Option<ClientSlot> {
        let max = self.config.max_websocket_connections;
        self.clients
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| ClientSlot {
                clients: self.clients.clone(),
            })
    }
}

/// Held for the lifetime of one WebSocket connection.
pub(crate) struct ClientSlot {
    clients: Arc<AtomicUsize>,
}

impl Drop for ClientSlot {
    fn drop(&mut self) {
        self.clients.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::Thresholds;

    #[test]
    fn test_client_slots_limited_and_released() {
        let (_tx, rx) = watch::channel(DashboardSnapshot::empty(Thresholds::default()));
        let state = AppState::new(
            WebConfig::default().with_max_websocket_connections(2),
            rx,
            SensorControls::new(),
        );

        let a = state.try_acquire_client().unwrap();
        let _b = state.try_acquire_client().unwrap();
        assert!(state.try_acquire_client().is_none());
        assert_eq!(state.connected_clients(), 2);

        drop(a);
        assert_eq!(state.connected_clients(), 1);
        assert!(state.try_acquire_client().is_some());
    }
}
