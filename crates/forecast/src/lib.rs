//! `medstock-forecast`
//!
//! **Responsibility:** consumption forecasting and pattern detection.
//!
//! This crate sits beside the aggregation engine, not on top of it:
//! - It reads `ProductRecord`s and never mutates them.
//! - It emits insights (`ForecastResult`, `PatternDetectionResult`), not
//!   records to be stored.
//! - Models are self-contained smoothing heuristics; there is no external
//!   statistics dependency.

pub mod config;
pub mod engine;
pub mod models;
pub mod patterns;
pub mod result;
pub mod series;

mod stats;

pub use config::{
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_FEATURES, ForecastConfig, Hyperparameters, MlModelConfig,
    ModelType,
};
pub use engine::{BatchReport, FALLBACK_ACCURACY, ForecastingEngine, fallback_result};
pub use models::{
    ArimaStrategy, ForecastStrategy, LstmStrategy, ModelInput, ProphetStrategy, StrategyOutput,
};
pub use patterns::{
    Anomalies, CyclicPattern, PatternDetectionResult, Seasonality, Trend, TrendDirection,
};
pub use result::{ConfidenceInterval, ForecastError, ForecastResult, ModelMetrics};
pub use series::{FULL_FEATURE_WIDTH, engineer_features, extract_time_series};
