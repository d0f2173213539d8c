use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use medstock_analytics::{
    AggregationEngine, CacheConfig, HierarchyManager, InMemoryFacilityDirectory, MetricsCalculator,
    MetricsCompute, TtlCache,
};
use medstock_auth::Caller;
use medstock_core::{AggregationLevel, FacilityId, LevelType, PeriodRecord, ProductClass, ProductRecord};
use std::sync::Arc;

fn synthetic_records(count: usize) -> Vec<ProductRecord> {
    (0..count)
        .map(|i| {
            let periods = (0..12)
                .map(|m| {
                    PeriodRecord::new(format!("2024-{:02}", m + 1), 20.0 + (i % 7) as f64)
                        .with_balances(100.0, 40.0)
                        .with_stock_out_days(if (i + m) % 11 == 0 { 3 } else { 0 })
                        .with_expired_damaged((m % 3) as f64)
                })
                .collect();
            ProductRecord::new(
                format!("product-{i}"),
                ProductClass::ALL[i % 3],
                1.5,
                FacilityId::new(format!("F{}", i % 40)),
            )
            .with_periods(periods)
            .expect("synthetic periods are valid")
        })
        .collect()
}

fn directory() -> InMemoryFacilityDirectory {
    let mut dir = InMemoryFacilityDirectory::new();
    for f in 0..40 {
        dir.insert(format!("F{f}").as_str(), format!("Z{}", f % 8).as_str(), format!("R{}", f % 2).as_str());
    }
    dir
}

fn bench_compute_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_metrics");

    for size in [100usize, 1_000, 10_000].iter() {
        let records = synthetic_records(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| MetricsCalculator.compute_metrics(black_box(records)));
        });
    }

    group.finish();
}

fn bench_aggregate_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_hierarchy");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .build()
        .expect("runtime");

    let records = synthetic_records(5_000);
    let mut levels: Vec<AggregationLevel> = (0..8)
        .map(|z| AggregationLevel::new(format!("Z{z}"), format!("Zone {z}"), LevelType::Zonal))
        .collect();
    levels.push(AggregationLevel::new("R0", "Region 0", LevelType::Regional));
    levels.push(AggregationLevel::new("R1", "Region 1", LevelType::Regional));
    levels.push(AggregationLevel::national());

    group.bench_function("cold_cache", |b| {
        b.iter(|| {
            let engine = AggregationEngine::new(
                Arc::new(TtlCache::new(CacheConfig::default()).expect("cache")),
                HierarchyManager::new(Arc::new(directory())),
            );
            runtime
                .block_on(engine.aggregate_hierarchy(black_box(&records), &levels, &Caller::national()))
                .expect("aggregation")
        });
    });

    let warm = AggregationEngine::new(
        Arc::new(TtlCache::new(CacheConfig::default()).expect("cache")),
        HierarchyManager::new(Arc::new(directory())),
    );
    group.bench_function("warm_cache", |b| {
        b.iter(|| {
            runtime
                .block_on(warm.aggregate_hierarchy(black_box(&records), &levels, &Caller::national()))
                .expect("aggregation")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_compute_metrics, bench_aggregate_hierarchy);
criterion_main!(benches);
