use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glucose_bridge::models::GlucoseMeasurement;
use glucose_bridge::services::to_record;
use glucose_bridge::time_utils::parse_factory_timestamp;

fn measurement(factory_timestamp: &str) -> GlucoseMeasurement {
    GlucoseMeasurement {
        factory_timestamp: factory_timestamp.to_string(),
        timestamp: None,
        value: 120.0,
        value_in_mg_per_dl: Some(120.0),
        measurement_color: 1,
        glucose_units: 1,
        trend_arrow: Some(3),
        is_high: false,
        is_low: false,
    }
}

fn benchmark_record_mapping(c: &mut Criterion) {
    let valid = measurement("12/31/2024 11:59:59 PM");
    let invalid = measurement("2024-12-31T23:59:59Z");

    let mut group = c.benchmark_group("record_mapping");

    group.bench_function("factory_timestamp", |b| {
        b.iter(|| parse_factory_timestamp(black_box("1/2/2024 3:04:05 PM")))
    });

    group.bench_function("valid_measurement", |b| {
        b.iter(|| to_record(black_box(&valid), "glucose-bridge"))
    });

    group.bench_function("rejected_timestamp", |b| {
        b.iter(|| to_record(black_box(&invalid), "glucose-bridge"))
    });

    group.finish();
}

criterion_group!(benches, benchmark_record_mapping);
criterion_main!(benches);
