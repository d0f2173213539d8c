//! Forecast strategies.
//!
//! Each strategy is a lightweight smoothing heuristic named after the model
//! family it stands in for. Coefficients, decay constants and band widths are
//! part of the output contract.

use crate::config::{Hyperparameters, ModelType};
use crate::result::{ConfidenceInterval, ForecastError};
use crate::series::trailing_mean;
use crate::stats::stddev_population;

/// Season length, in periods, used by the seasonal strategies.
pub const SEASON_LENGTH: usize = 12;
/// Minimum observations any strategy accepts.
pub const MIN_OBSERVATIONS: usize = 2;

const PROPHET_TREND_WINDOW: usize = 3;
const PROPHET_BAND: f64 = 0.15;
const ARIMA_Z_95: f64 = 1.96;
const LSTM_WINDOW: usize = 12;
const LSTM_DECAY: f64 = 0.1;
const LSTM_BAND: f64 = 0.20;

/// Input handed to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct ModelInput<'a> {
    /// Strictly positive consumption values, oldest first.
    pub values: &'a [f64],
    /// Engineered feature rows, one per value. The built-in strategies
    /// read only `values`; the rows are sized into `ModelMetrics` and are
    /// available to strategies that regress on them.
    pub features: &'a [Vec<f64>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutput {
    pub predictions: Vec<f64>,
    pub intervals: Vec<ConfidenceInterval>,
}

/// A forecasting model: maps an observed series to `horizon` predictions
/// with a confidence band for each.
///
/// Must be deterministic and must not retain state between calls.
pub trait ForecastStrategy: Send + Sync {
    fn model_type(&self) -> ModelType;

    /// Simulated training cost per observation, in milliseconds.
    fn training_cost_per_point_ms(&self) -> f64;

    fn forecast(
        &self,
        input: &ModelInput<'_>,
        horizon: usize,
    ) -> Result<StrategyOutput, ForecastError>;
}

fn ensure_observations(values: &[f64]) -> Result<(), ForecastError> {
    if values.len() < MIN_OBSERVATIONS {
        return Err(ForecastError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Trend + seasonal decomposition with linear trend extrapolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProphetStrategy;

impl ForecastStrategy for ProphetStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::Prophet
    }

    fn training_cost_per_point_ms(&self) -> f64 {
        2.0
    }

    fn forecast(
        &self,
        input: &ModelInput<'_>,
        horizon: usize,
    ) -> Result<StrategyOutput, ForecastError> {
        let values = input.values;
        ensure_observations(values)?;
        let n = values.len();

        let trend: Vec<f64> = (0..n)
            .map(|i| trailing_mean(values, i, PROPHET_TREND_WINDOW))
            .collect();

        let mut sums = [0.0; SEASON_LENGTH];
        let mut counts = [0usize; SEASON_LENGTH];
        for (i, (v, t)) in values.iter().zip(&trend).enumerate() {
            sums[i % SEASON_LENGTH] += v - t;
            counts[i % SEASON_LENGTH] += 1;
        }
        let seasonal: Vec<f64> = sums
            .iter()
            .zip(counts)
            .map(|(s, c)| if c == 0 { 0.0 } else { s / c as f64 })
            .collect();

        let slope = (1..n).map(|i| trend[i] - trend[i - 1]).sum::<f64>() / (n - 1) as f64;
        let last_trend = trend[n - 1];

        let predictions: Vec<f64> = (1..=horizon)
            .map(|step| {
                let season = seasonal[(n - 1 + step) % SEASON_LENGTH];
                (last_trend + slope * step as f64 + season).max(0.0)
            })
            .collect();
        let intervals = predictions
            .iter()
            .map(|p| ConfidenceInterval::relative(*p, PROPHET_BAND, PROPHET_BAND))
            .collect();

        Ok(StrategyOutput {
            predictions,
            intervals,
        })
    }
}

/// Triple exponential smoothing: level, trend and multiplicative seasonal
/// factors.
#[derive(Debug, Clone, Copy)]
pub struct ArimaStrategy {
    params: Hyperparameters,
}

impl ArimaStrategy {
    pub fn new(params: Hyperparameters) -> Self {
        Self { params }
    }
}

impl Default for ArimaStrategy {
    fn default() -> Self {
        Self::new(Hyperparameters::default())
    }
}

impl ForecastStrategy for ArimaStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::Arima
    }

    fn training_cost_per_point_ms(&self) -> f64 {
        0.5
    }

    fn forecast(
        &self,
        input: &ModelInput<'_>,
        horizon: usize,
    ) -> Result<StrategyOutput, ForecastError> {
        let values = input.values;
        ensure_observations(values)?;
        let n = values.len();
        let Hyperparameters {
            alpha,
            beta,
            gamma,
            phi,
        } = self.params;

        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut seasonal = [1.0_f64; SEASON_LENGTH];
        let mut residuals = Vec::with_capacity(n - 1);

        for (t, &y) in values.iter().enumerate().skip(1) {
            let slot = t % SEASON_LENGTH;
            let s = if seasonal[slot].abs() > f64::EPSILON {
                seasonal[slot]
            } else {
                1.0
            };

            let fitted = (level + phi * trend) * s;
            residuals.push(y - fitted);

            let previous_level = level;
            level = alpha * (y / s) + (1.0 - alpha) * (previous_level + phi * trend);
            trend = beta * (level - previous_level) + (1.0 - beta) * phi * trend;
            if level.abs() > f64::EPSILON {
                seasonal[slot] = gamma * (y / level) + (1.0 - gamma) * s;
            }
        }

        let margin = ARIMA_Z_95 * stddev_population(&residuals);

        let mut damped_trend = 0.0;
        let mut damping = 1.0;
        let mut predictions = Vec::with_capacity(horizon);
        let mut intervals = Vec::with_capacity(horizon);
        for step in 1..=horizon {
            damping *= phi;
            damped_trend += damping * trend;
            let factor = seasonal[(n - 1 + step) % SEASON_LENGTH];
            let p = ((level + damped_trend) * factor).max(0.0);
            predictions.push(p);
            intervals.push(ConfidenceInterval::new((p - margin).max(0.0), p + margin));
        }

        if predictions.iter().any(|p| !p.is_finite()) || !margin.is_finite() {
            return Err(ForecastError::InferenceFailed(
                "exponential smoothing diverged".to_string(),
            ));
        }

        Ok(StrategyOutput {
            predictions,
            intervals,
        })
    }
}

/// Exponentially weighted sliding window, extended auto-regressively.
#[derive(Debug, Clone, Copy, Default)]
pub struct LstmStrategy;

impl ForecastStrategy for LstmStrategy {
    fn model_type(&self) -> ModelType {
        ModelType::Lstm
    }

    fn training_cost_per_point_ms(&self) -> f64 {
        8.0
    }

    fn forecast(
        &self,
        input: &ModelInput<'_>,
        horizon: usize,
    ) -> Result<StrategyOutput, ForecastError> {
        ensure_observations(input.values)?;

        let mut working = input.values.to_vec();
        let mut predictions = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let window = LSTM_WINDOW.min(working.len());
            let recent = &working[working.len() - window..];

            let mut weighted = 0.0;
            let mut total_weight = 0.0;
            for (i, v) in recent.iter().enumerate() {
                // age 0 is the newest point
                let age = (window - 1 - i) as f64;
                let w = (-LSTM_DECAY * age).exp();
                weighted += w * v;
                total_weight += w;
            }

            let next = weighted / total_weight;
            predictions.push(next);
            working.push(next);
        }

        let intervals = predictions
            .iter()
            .map(|p| ConfidenceInterval::relative(*p, LSTM_BAND, LSTM_BAND))
            .collect();

        Ok(StrategyOutput {
            predictions,
            intervals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(strategy: &dyn ForecastStrategy, values: &[f64], horizon: usize) -> StrategyOutput {
        let input = ModelInput {
            values,
            features: &[],
        };
        strategy.forecast(&input, horizon).unwrap()
    }

    #[test]
    fn prophet_extends_linear_trend() {
        let values: Vec<f64> = (1..=24).map(|i| 10.0 * i as f64).collect();
        let out = run(&ProphetStrategy, &values, 3);

        // Trend of a straight line lags by one step; slope stays 10.
        assert_eq!(out.predictions.len(), 3);
        assert!(out.predictions[1] > out.predictions[0]);
        assert!(out.predictions[2] > out.predictions[1]);
        let band = out.intervals[0];
        assert!((band.lower - out.predictions[0] * 0.85).abs() < 1e-9);
        assert!((band.upper - out.predictions[0] * 1.15).abs() < 1e-9);
    }

    #[test]
    fn prophet_clamps_at_zero() {
        let values = [100.0, 80.0, 60.0, 40.0, 20.0, 1.0];
        let out = run(&ProphetStrategy, &values, 12);
        assert!(out.predictions.iter().all(|p| *p >= 0.0));
        assert_eq!(*out.predictions.last().unwrap(), 0.0);
    }

    #[test]
    fn arima_constant_series_is_flat_with_zero_band() {
        let values = [50.0; 12];
        let out = run(&ArimaStrategy::default(), &values, 4);
        for (p, ci) in out.predictions.iter().zip(&out.intervals) {
            assert!((p - 50.0).abs() < 1e-9);
            assert!((ci.upper - ci.lower).abs() < 1e-9);
        }
    }

    #[test]
    fn arima_band_widens_with_noise() {
        let values = [40.0, 60.0, 35.0, 65.0, 42.0, 58.0, 38.0, 62.0];
        let out = run(&ArimaStrategy::default(), &values, 2);
        assert!(out.intervals[0].upper - out.intervals[0].lower > 1.0);
        assert!(out.intervals.iter().all(|ci| ci.lower <= ci.upper));
    }

    #[test]
    fn lstm_weights_recent_points_more() {
        let out = run(&LstmStrategy, &[10.0, 10.0, 10.0, 40.0], 1);
        let p = out.predictions[0];
        // plain mean would be 17.5
        assert!(p > 17.5 && p < 40.0);
        assert!((out.intervals[0].lower - p * 0.8).abs() < 1e-9);
        assert!((out.intervals[0].upper - p * 1.2).abs() < 1e-9);
    }

    #[test]
    fn lstm_constant_series_stays_constant() {
        let out = run(&LstmStrategy, &[7.0; 20], 5);
        assert!(out.predictions.iter().all(|p| (p - 7.0).abs() < 1e-12));
    }

    #[test]
    fn built_in_strategies_depend_only_on_values() {
        let values = [12.0, 18.0, 15.0, 21.0, 19.0, 25.0];
        let features = vec![vec![1.0; 19]; values.len()];
        let with_rows = ModelInput {
            values: &values,
            features: &features,
        };
        for strategy in [
            &ProphetStrategy as &dyn ForecastStrategy,
            &ArimaStrategy::default(),
            &LstmStrategy,
        ] {
            assert_eq!(
                strategy.forecast(&with_rows, 4).unwrap(),
                run(strategy, &values, 4)
            );
        }
    }

    #[test]
    fn single_point_is_rejected() {
        let input = ModelInput {
            values: &[5.0],
            features: &[],
        };
        for strategy in [
            &ProphetStrategy as &dyn ForecastStrategy,
            &ArimaStrategy::default(),
            &LstmStrategy,
        ] {
            assert!(matches!(
                strategy.forecast(&input, 3),
                Err(ForecastError::InsufficientData { actual: 1, .. })
            ));
        }
    }
}
