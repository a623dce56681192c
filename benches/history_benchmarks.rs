use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use starlink_exporter::{
    metrics::{summarize_by_cause, OutageTracker},
    DishMetrics, OutageRecord,
};

const CAUSES: [&str; 4] = ["OBSTRUCTED", "NO_DOWNLINK", "NO_SCHEDULE", "NO_PINGS"];

fn window(len: usize, first_start: i64) -> Vec<OutageRecord> {
    (0..len)
        .map(|i| OutageRecord {
            start_timestamp_ns: first_start + i as i64 * 1_000_000_000,
            duration_ns: 250_000_000 + (i as u64 % 40) * 100_000_000,
            cause: CAUSES[i % CAUSES.len()].to_string(),
            did_switch: i % 3 == 0,
        })
        .collect()
}

/// Benchmark the watermark scan on a window that has rolled forward by a few records
fn bench_outage_tracking(c: &mut Criterion) {
    for len in [100usize, 1_000, 10_000].iter() {
        let previous = window(*len, 0);
        let current = window(*len, 5_000_000_000);

        c.bench_with_input(BenchmarkId::new("outage_tracking", len), len, |b, _| {
            b.iter(|| {
                let mut tracker = OutageTracker::new();
                tracker.advance(&previous);
                tracker.advance(&current).len()
            })
        });
    }
}

/// Benchmark per-cause aggregation and the gauge writes that follow it
fn bench_cause_summaries(c: &mut Criterion) {
    let metrics = DishMetrics::new().expect("Should register metrics");
    let records = window(10_000, 0);

    c.bench_function("summarize_by_cause", |b| {
        b.iter(|| summarize_by_cause(&records))
    });

    c.bench_function("record_cause_summaries", |b| {
        let summaries = summarize_by_cause(&records);
        b.iter(|| metrics.record_cause_summaries(&summaries))
    });
}

/// Benchmark rendering the registry for a scrape
fn bench_encode_text(c: &mut Criterion) {
    let metrics = DishMetrics::new().expect("Should register metrics");
    metrics.record_cause_summaries(&summarize_by_cause(&window(1_000, 0)));

    c.bench_function("encode_text", |b| {
        b.iter(|| metrics.encode_text().expect("Should encode"))
    });
}

criterion_group!(
    benches,
    bench_outage_tracking,
    bench_cause_summaries,
    bench_encode_text
);
criterion_main!(benches);
