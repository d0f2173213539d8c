//! Per-product forecasting, fallback and batch orchestration.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use medstock_core::ProductRecord;

use crate::config::{ForecastConfig, MlModelConfig, ModelType};
use crate::models::{ForecastStrategy, ModelInput};
use crate::patterns::{self, PatternDetectionResult};
use crate::result::{ConfidenceInterval, ForecastError, ForecastResult, ModelMetrics};
use crate::series::{engineer_features, extract_time_series};

/// Accuracy reported for the flat fallback forecast.
pub const FALLBACK_ACCURACY: f64 = 50.0;
const FALLBACK_BAND_BELOW: f64 = 0.30;
const FALLBACK_BAND_ABOVE: f64 = 0.40;

/// Outcome of a batched run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One result per input product, in input order.
    pub results: Vec<ForecastResult>,
    /// How many results are the flat fallback.
    pub fallbacks: usize,
    pub batches: usize,
}

/// Forecasts consumption per product and detects patterns in its history.
///
/// Only configuration errors surface as `Err`. Anything that goes wrong
/// while modelling a single product degrades that product to the flat AAMC
/// forecast; the rest of the batch is unaffected.
#[derive(Debug, Clone, Default)]
pub struct ForecastingEngine {
    config: ForecastConfig,
}

impl ForecastingEngine {
    pub fn new(config: ForecastConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast every product, `batch_size` at a time.
    pub async fn forecast(
        &self,
        products: &[ProductRecord],
        model: &MlModelConfig,
        horizon: usize,
    ) -> Result<Vec<ForecastResult>, ForecastError> {
        Ok(self.forecast_batched(products, model, horizon).await?.results)
    }

    /// Like [`forecast`](Self::forecast), with batch bookkeeping.
    ///
    /// Products within a batch are forecast concurrently; batches run one
    /// after another so at most `batch_size` tasks are in flight.
    pub async fn forecast_batched(
        &self,
        products: &[ProductRecord],
        model: &MlModelConfig,
        horizon: usize,
    ) -> Result<BatchReport, ForecastError> {
        validate_request(model, horizon)?;

        let strategy: Arc<dyn ForecastStrategy> = Arc::from(model.strategy());
        let mut results = Vec::with_capacity(products.len());
        let mut batches = 0;

        for batch in products.chunks(self.config.batch_size) {
            batches += 1;
            let mut slots: Vec<Option<ForecastResult>> = vec![None; batch.len()];

            let mut tasks = JoinSet::new();
            for (index, product) in batch.iter().cloned().enumerate() {
                let engine = self.clone();
                let strategy = Arc::clone(&strategy);
                tasks.spawn(async move {
                    let result = engine.run_product(&product, strategy.as_ref(), horizon);
                    (index, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, result)) => slots[index] = Some(result),
                    Err(err) => {
                        tracing::warn!(error = %err, batch = batches, "forecast task failed");
                    }
                }
            }

            // A failed task leaves its slot empty; it gets the fallback too.
            for (slot, product) in slots.into_iter().zip(batch) {
                results.push(
                    slot.unwrap_or_else(|| fallback_result(product, model.model_type, horizon)),
                );
            }

            tracing::debug!(batch = batches, size = batch.len(), "forecast batch complete");
        }

        let fallbacks = results.iter().filter(|r| r.fallback).count();
        tracing::info!(
            products = products.len(),
            model = %model.model_type,
            horizon,
            batches,
            fallbacks,
            "forecast run complete"
        );

        Ok(BatchReport {
            results,
            fallbacks,
            batches,
        })
    }

    /// Forecast a single product.
    pub fn forecast_product(
        &self,
        product: &ProductRecord,
        model: &MlModelConfig,
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        validate_request(model, horizon)?;
        let strategy = model.strategy();
        Ok(self.run_product(product, strategy.as_ref(), horizon))
    }

    /// Seasonality, trend, anomalies and cycles of the product's positive
    /// consumption history.
    pub fn detect_patterns(&self, product: &ProductRecord) -> PatternDetectionResult {
        patterns::detect(&extract_time_series(product))
    }

    fn run_product(
        &self,
        product: &ProductRecord,
        strategy: &dyn ForecastStrategy,
        horizon: usize,
    ) -> ForecastResult {
        match self.try_forecast(product, strategy, horizon) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    product_id = %product.id,
                    model = %strategy.model_type(),
                    error = %err,
                    "model failed; using flat AAMC forecast"
                );
                fallback_result(product, strategy.model_type(), horizon)
            }
        }
    }

    fn try_forecast(
        &self,
        product: &ProductRecord,
        strategy: &dyn ForecastStrategy,
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        let values = extract_time_series(product);
        let features = engineer_features(product, &values, self.config.max_features);

        let started = Instant::now();
        let output = strategy.forecast(
            &ModelInput {
                values: &values,
                features: &features,
            },
            horizon,
        )?;
        let inference_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        if output.predictions.len() != horizon || output.intervals.len() != horizon {
            return Err(ForecastError::InferenceFailed(format!(
                "expected {horizon} predictions, got {} with {} intervals",
                output.predictions.len(),
                output.intervals.len()
            )));
        }
        if output
            .predictions
            .iter()
            .chain(output.intervals.iter().flat_map(|ci| [&ci.lower, &ci.upper]))
            .any(|v| !v.is_finite())
        {
            return Err(ForecastError::InferenceFailed(
                "non-finite prediction".to_string(),
            ));
        }

        let fit = score_in_sample(&values, &output.predictions);
        let feature_width = features.first().map_or(0, Vec::len);

        Ok(ForecastResult {
            product_id: product.id,
            model_type: strategy.model_type(),
            predictions: output.predictions,
            confidence_intervals: output.intervals,
            accuracy: fit.accuracy,
            mae: fit.mae,
            rmse: fit.rmse,
            model_metrics: ModelMetrics {
                training_time_ms: values.len() as f64 * strategy.training_cost_per_point_ms(),
                inference_time_ms,
                memory_bytes: (values.len() + features.len() * feature_width + 3 * horizon)
                    * size_of::<f64>(),
                feature_width,
            },
            fallback: false,
        })
    }
}

fn validate_request(model: &MlModelConfig, horizon: usize) -> Result<(), ForecastError> {
    model.validate()?;
    if horizon == 0 {
        return Err(ForecastError::InvalidConfig(
            "horizon must be at least one period".to_string(),
        ));
    }
    Ok(())
}

/// Flat forecast at the product's AAMC.
pub fn fallback_result(
    product: &ProductRecord,
    model_type: ModelType,
    horizon: usize,
) -> ForecastResult {
    let level = match product.annual.aamc {
        aamc if aamc.is_finite() && aamc > 0.0 => aamc,
        _ => 0.0,
    };

    ForecastResult {
        product_id: product.id,
        model_type,
        predictions: vec![level; horizon],
        confidence_intervals: vec![
            ConfidenceInterval::relative(level, FALLBACK_BAND_BELOW, FALLBACK_BAND_ABOVE);
            horizon
        ],
        accuracy: FALLBACK_ACCURACY,
        mae: 0.0,
        rmse: 0.0,
        model_metrics: ModelMetrics::default(),
        fallback: true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InSampleFit {
    accuracy: f64,
    mae: f64,
    rmse: f64,
}

/// Replay the first `k` predictions against the last `k` observations,
/// `k = min(predictions, observations)`.
fn score_in_sample(values: &[f64], predictions: &[f64]) -> InSampleFit {
    let k = predictions.len().min(values.len());
    if k == 0 {
        return InSampleFit {
            accuracy: 0.0,
            mae: 0.0,
            rmse: 0.0,
        };
    }

    let actual = &values[values.len() - k..];
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = 0.0;
    for (a, p) in actual.iter().zip(&predictions[..k]) {
        let err = (a - p).abs();
        abs_sum += err;
        sq_sum += err * err;
        // series values are strictly positive
        pct_sum += err / a;
    }

    let n = k as f64;
    let mape = pct_sum / n * 100.0;
    InSampleFit {
        accuracy: (100.0 - mape).clamp(0.0, 100.0),
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
    }
}
