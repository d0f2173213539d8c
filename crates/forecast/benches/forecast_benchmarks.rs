use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use medstock_core::{FacilityId, PeriodRecord, ProductClass, ProductRecord};
use medstock_forecast::{ForecastConfig, ForecastingEngine, MlModelConfig, ModelType};

fn synthetic_products(count: usize, months: usize) -> Vec<ProductRecord> {
    (0..count)
        .map(|i| {
            let periods = (0..months)
                .map(|m| {
                    let seasonal = 12.0 * ((m as f64) * std::f64::consts::PI / 6.0).sin();
                    let consumption = 80.0 + (i % 13) as f64 + 0.5 * m as f64 + seasonal;
                    PeriodRecord::new(format!("M{m:03}"), consumption)
                        .with_balances(150.0, 60.0)
                })
                .collect();
            ProductRecord::new(
                format!("product-{i}"),
                ProductClass::ALL[i % 3],
                3.0,
                FacilityId::new(format!("F{}", i % 25)),
            )
            .with_periods(periods)
            .expect("synthetic periods are valid")
        })
        .collect()
}

fn bench_single_product(c: &mut Criterion) {
    // Model fallbacks log at warn; keep them visible when benches misbehave.
    medstock_observability::init();
    let mut group = c.benchmark_group("forecast_product");
    let engine = ForecastingEngine::default();
    let product = synthetic_products(1, 36).remove(0);

    for model in [ModelType::Prophet, ModelType::Arima, ModelType::Lstm] {
        let config = MlModelConfig::new(model);
        group.bench_with_input(BenchmarkId::from_parameter(model), &config, |b, config| {
            b.iter(|| engine.forecast_product(black_box(&product), config, 12));
        });
    }

    group.finish();
}

fn bench_batched(c: &mut Criterion) {
    let mut group = c.benchmark_group("forecast_batched");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .build()
        .expect("runtime");
    let engine = ForecastingEngine::new(ForecastConfig::default().with_batch_size(250))
        .expect("engine config");
    let model = MlModelConfig::new(ModelType::Arima);

    for size in [100usize, 1_000].iter() {
        let products = synthetic_products(*size, 24);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &products, |b, products| {
            b.iter(|| {
                runtime
                    .block_on(engine.forecast_batched(black_box(products), &model, 6))
                    .expect("forecast")
            });
        });
    }

    group.finish();
}

fn bench_patterns(c: &mut Criterion) {
    let engine = ForecastingEngine::default();
    let product = synthetic_products(1, 60).remove(0);
    c.bench_function("detect_patterns", |b| {
        b.iter(|| engine.detect_patterns(black_box(&product)));
    });
}

criterion_group!(benches, bench_single_product, bench_batched, bench_patterns);
criterion_main!(benches);
