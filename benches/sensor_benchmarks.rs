use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use labkit::postal::{validate_payload, PostalCode};
use labkit::retry::RetryPolicy;
use labkit::sensor::{
    DashboardSnapshot, ReadingHistory, ReadingSource, SensorSimulator, Severity, SimulatorConfig, Thresholds,
};
use std::time::Duration;

fn filled_snapshot(capacity: usize) -> DashboardSnapshot {
    let mut simulator = SensorSimulator::seeded(SimulatorConfig::default(), 7);
    let mut history = ReadingHistory::new(capacity);
    for _ in 0..capacity {
        history.push(simulator.read().expect("Should read"));
    }

    let mut snapshot = DashboardSnapshot::empty(Thresholds::default());
    snapshot.ticks = capacity as u64;
    snapshot.latest = history.latest().copied();
    snapshot.stats = history.stats();
    snapshot.history = history.to_vec();
    snapshot
}

/// Benchmark simulated sensor reads
fn bench_simulator_read(c: &mut Criterion) {
    let mut simulator = SensorSimulator::seeded(SimulatorConfig::default(), 42);
    c.bench_function("simulator_read", |b| {
        b.iter(|| simulator.read().expect("Should read"))
    });
}

/// Benchmark history push and statistics at several capacities
fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("reading_history");
    let mut simulator = SensorSimulator::seeded(SimulatorConfig::default(), 1);
    let reading = simulator.read().expect("Should read");

    for capacity in [10, 50, 500] {
        let mut history = ReadingHistory::new(capacity);
        for _ in 0..capacity {
            history.push(reading);
        }

        group.bench_with_input(BenchmarkId::new("push", capacity), &capacity, |b, _| {
            b.iter(|| history.push(reading))
        });
        group.bench_with_input(BenchmarkId::new("stats", capacity), &capacity, |b, _| {
            b.iter(|| history.stats())
        });
    }
    group.finish();
}

/// Benchmark JSON serialization of dashboard snapshots
fn bench_snapshot_serialization(c: &mut Criterion) {
    let snapshot = filled_snapshot(50);
    c.bench_function("snapshot_json_serialization", |b| {
        b.iter(|| serde_json::to_string(&snapshot).expect("Should serialize"))
    });

    let json = serde_json::to_string(&snapshot).expect("Should serialize");
    c.bench_function("snapshot_json_deserialization", |b| {
        b.iter(|| serde_json::from_str::<DashboardSnapshot>(&json).expect("Should deserialize"))
    });
}

fn bench_classification(c: &mut Criterion) {
    let thresholds = Thresholds::default();
    c.bench_function("severity_classify", |b| {
        b.iter(|| {
            let mut t = 0.0;
            while t < 50.0 {
                std::hint::black_box(Severity::classify(t, &thresholds));
                t += 0.5;
            }
        })
    });

    c.bench_function("postal_code_parse", |b| {
        b.iter(|| PostalCode::parse(std::hint::black_box("01.001-000")).expect("Should parse"))
    });

    let payload = serde_json::json!({
        "cep": "01001000",
        "logradouro": "Praça da Sé",
        "bairro": "Sé",
        "cidade": { "nome": "São Paulo", "ddd": 11 },
        "estado": { "sigla": "SP" }
    });
    c.bench_function("payload_validation", |b| b.iter(|| validate_payload(&payload)));
}

/// Benchmark executor overhead on a call that succeeds first time
fn bench_retry_overhead(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");
    let policy = RetryPolicy::new(3, Duration::from_millis(1)).expect("Should build policy");

    c.bench_function("retry_execute_success", |b| {
        b.to_async(&rt)
            .iter(|| async { policy.execute(|| async { Ok::<_, labkit::LabError>(1u32) }).await })
    });
}

criterion_group!(
    benches,
    bench_simulator_read,
    bench_history,
    bench_snapshot_serialization,
    bench_classification,
    bench_retry_overhead
);
criterion_main!(benches);
