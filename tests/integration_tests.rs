use labkit::web::{create_app, AppState};
use labkit::{
    DashboardSnapshot, PollerConfig, SensorPoller, SensorSimulator, Severity, SimulatorConfig, WebConfig,
};
use std::time::Duration;
use tokio::time::timeout;

fn fast_poller(seed: u64) -> (labkit::PollerHandle, labkit::SensorControls) {
    let simulator = SensorSimulator::seeded(SimulatorConfig::default(), seed);
    let controls = simulator.controls();
    let config = PollerConfig::default()
        .with_interval(Duration::from_millis(10))
        .with_history_capacity(5);
    (SensorPoller::spawn(simulator, config), controls)
}

async fn wait_for_ticks(
    rx: &mut tokio::sync::watch::Receiver<DashboardSnapshot>,
    ticks: u64,
) -> DashboardSnapshot {
    timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.ticks >= ticks {
                return snapshot;
            }
            rx.changed().await.expect("Poller should still be running");
        }
    })
    .await
    .expect("Poller should reach the tick count in time")
}

#[tokio::test]
async fn test_poller_publishes_bounded_history() {
    let (poller, _controls) = fast_poller(1);
    let mut rx = poller.subscribe();

    let snapshot = wait_for_ticks(&mut rx, 8).await;
    assert!(snapshot.history.len() <= 5);
    assert_eq!(snapshot.latest, snapshot.history.last().copied());

    let stats = snapshot.stats.expect("Stats should exist after readings");
    assert!(stats.min_c <= stats.mean_c && stats.mean_c <= stats.max_c);

    poller.shutdown().await;
}

#[tokio::test]
async fn test_heat_control_raises_severity() {
    let (poller, controls) = fast_poller(2);
    let mut rx = poller.subscribe();

    controls.set_offsets(20.0, 0.0).expect("Should set offsets");
    let start = rx.borrow().ticks;
    let snapshot = wait_for_ticks(&mut rx, start + 2).await;

    assert_eq!(snapshot.severity(), Some(Severity::Critical));
    assert!(snapshot.alarm);

    poller.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_readings() {
    let (poller, _controls) = fast_poller(3);
    let mut rx = poller.subscribe();
    wait_for_ticks(&mut rx, 2).await;

    poller.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(poller.is_finished());

    let ticks = poller.latest().ticks;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(poller.latest().ticks, ticks);
}

#[tokio::test]
async fn test_dashboard_serves_live_snapshot() {
    let (poller, controls) = fast_poller(4);
    let mut rx = poller.subscribe();
    wait_for_ticks(&mut rx, 1).await;

    let app = create_app(AppState::new(WebConfig::default(), poller.subscribe(), controls));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind an ephemeral port");
    let addr = listener.local_addr().expect("Should have a local address");
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let http = reqwest::Client::new();
    let health: serde_json::Value = http
        .get(format!("http://{}/api/health", addr))
        .send()
        .await
        .expect("Health request should succeed")
        .json()
        .await
        .expect("Health should be JSON");
    assert_eq!(health["status"], "ok");

    let snapshot: DashboardSnapshot = http
        .get(format!("http://{}/api/snapshot", addr))
        .send()
        .await
        .expect("Snapshot request should succeed")
        .json()
        .await
        .expect("Snapshot should be JSON");
    assert!(snapshot.ticks >= 1);
    assert!(snapshot.latest.is_some());

    server.abort();
    poller.shutdown().await;
}
