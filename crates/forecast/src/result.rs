use serde::{Deserialize, Serialize};
use thiserror::Error;

use medstock_core::ProductId;

use crate::config::ModelType;

/// A `[lower, upper]` band around one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Band of `below`/`above` fractions around `value` (e.g. 0.15/0.15).
    pub fn relative(value: f64, below: f64, above: f64) -> Self {
        Self {
            lower: value * (1.0 - below),
            upper: value * (1.0 + above),
        }
    }
}

/// Cost figures attached to a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Simulated from series length and the strategy's per-point cost.
    pub training_time_ms: f64,
    /// Measured wall time of the strategy call.
    pub inference_time_ms: f64,
    /// Estimated working-set size of series, features and outputs.
    pub memory_bytes: usize,
    pub feature_width: usize,
}

/// Forecast for one product.
///
/// This is an analytics insight, not a stored record. `predictions` and
/// `confidence_intervals` always have exactly `horizon` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub product_id: ProductId,
    pub model_type: ModelType,
    pub predictions: Vec<f64>,
    pub confidence_intervals: Vec<ConfidenceInterval>,
    /// 0-100, from in-sample replay.
    pub accuracy: f64,
    pub mae: f64,
    pub rmse: f64,
    pub model_metrics: ModelMetrics,
    /// True when the model failed and the flat AAMC forecast was used.
    pub fallback: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    /// Configuration error: unknown model name.
    #[error("unsupported model type: '{0}'")]
    UnsupportedModel(String),

    /// Configuration error: bad hyperparameter, horizon, or engine setting.
    #[error("invalid forecast configuration: {0}")]
    InvalidConfig(String),

    #[error("insufficient data: need at least {required} positive observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

impl ForecastError {
    /// Configuration errors are rejected up front; everything else degrades
    /// to the fallback forecast for the affected product.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ForecastError::UnsupportedModel(_) | ForecastError::InvalidConfig(_)
        )
    }
}
