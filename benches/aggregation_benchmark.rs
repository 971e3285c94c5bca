//! Criterion benchmarks for incident aggregation
//!
//! Measures the grouped single pass behind the statistics, per-sector and
//! time-series endpoints at a few data set sizes.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use safety_incident_manager::{
    analytics::{GroupAccumulator, Grouping, Interval},
    models::{Incident, IncidentType, Severity},
};

fn generate_incidents(n: usize) -> Vec<Incident> {
    let types = [
        IncidentType::Fire,
        IncidentType::Fall,
        IncidentType::Ppe,
        IncidentType::Other,
    ];
    let severities = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    (0..n)
        .map(|i| {
            Incident::new(
                types[i % types.len()],
                severities[(i / 3) % severities.len()],
                0.9,
                format!("sector-{}", i % 25),
            )
            .with_timestamp(base + Duration::minutes(i as i64 * 37))
        })
        .collect()
}

fn aggregate(incidents: &[Incident], grouping: Grouping) -> usize {
    let mut acc = GroupAccumulator::new(grouping);
    for incident in incidents {
        acc.add(incident);
    }
    acc.finish().len()
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    for size in [1_000usize, 10_000, 100_000] {
        let incidents = generate_incidents(size);
        group.throughput(Throughput::Elements(size as u64));

        let groupings = [
            ("overall", Grouping::Overall),
            ("sector", Grouping::Sector),
            ("hour", Grouping::Time(Interval::Hour)),
            ("week", Grouping::Time(Interval::Week)),
        ];

        for (name, grouping) in groupings {
            group.bench_with_input(BenchmarkId::new(name, size), &incidents, |b, incidents| {
                b.iter(|| aggregate(black_box(incidents), grouping));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_grouping);
criterion_main!(benches);
