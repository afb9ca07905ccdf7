use chrono::{NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use forecast_fusion::{
    Config, FieldKind, MemberAggregator, Pipeline, RawSeries, SourceDescriptor, TimeBucketer,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn hourly_index(hours: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2026, 8, 6)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..hours)
        .map(|i| start + chrono::Duration::hours(i as i64))
        .collect()
}

/// Synthetic ensemble with realistic-looking member scatter.
fn synthetic_ensemble(members: usize, hours: usize) -> RawSeries {
    let mut rng = StdRng::seed_from_u64(42);
    let mut builder = RawSeries::builder(hourly_index(hours)).unwrap();
    let src = builder.add_source(SourceDescriptor::ensemble(
        "ecmwf_ifs025_ensemble",
        members,
        vec![
            FieldKind::Temperature,
            FieldKind::Precipitation,
            FieldKind::WeatherCode,
        ],
    ));

    let code_pool = [0.0, 1.0, 2.0, 3.0, 61.0, 95.0];
    for m in 0..members {
        let temps = (0..hours)
            .map(|h| Some(26.0 + (h % 24) as f64 * 0.3 + rng.gen_range(-1.5..1.5)))
            .collect();
        let precip = (0..hours)
            .map(|_| Some(if rng.gen_bool(0.3) { rng.gen_range(0.0..2.0) } else { 0.0 }))
            .collect();
        let codes = (0..hours)
            .map(|_| Some(code_pool[rng.gen_range(0..code_pool.len())]))
            .collect();
        builder.push_column(src, FieldKind::Temperature, m, temps).unwrap();
        builder.push_column(src, FieldKind::Precipitation, m, precip).unwrap();
        builder.push_column(src, FieldKind::WeatherCode, m, codes).unwrap();
    }
    builder.build()
}

fn reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 6)
        .unwrap()
        .and_hms_opt(7, 30, 0)
        .unwrap()
}

/// Benchmark the full pipeline over a 51-member, 3-day ensemble - the
/// heaviest realistic workload.
fn bench_pipeline_run(c: &mut Criterion) {
    let config = Config::default();
    let pipeline = Pipeline::from_config(&config);
    let series = synthetic_ensemble(51, 72);
    let now = reference_time();

    c.bench_function("pipeline_run_51_members", |b| {
        b.iter(|| {
            black_box(pipeline.run(black_box(&series), black_box(now)));
        });
    });
}

/// Benchmark one bucket summarization across ensemble sizes.
fn bench_summarize_by_member_count(c: &mut Criterion) {
    let aggregator = MemberAggregator::new(0.1);
    let config = Config::default();
    let bucketer = TimeBucketer::new(
        config.buckets.horizon_days,
        config.buckets.grace_minutes,
        config.buckets.day_parts.clone(),
    );
    let bucket = bucketer.upcoming(reference_time())[0].clone();

    let mut group = c.benchmark_group("summarize_bucket");
    for members in [1usize, 18, 51].iter() {
        let series = synthetic_ensemble(*members, 72);
        group.bench_with_input(BenchmarkId::from_parameter(members), members, |b, _| {
            b.iter(|| {
                black_box(aggregator.summarize(black_box(&series), black_box(&bucket), 0));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline_run, bench_summarize_by_member_count);
criterion_main!(benches);
