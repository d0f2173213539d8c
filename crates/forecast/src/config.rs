//! Model selection and forecasting configuration.

use core::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::models::{ArimaStrategy, ForecastStrategy, LstmStrategy, ProphetStrategy};
use crate::result::ForecastError;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_FEATURES: usize = 50;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Prophet,
    Arima,
    Lstm,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Prophet => "prophet",
            ModelType::Arima => "arima",
            ModelType::Lstm => "lstm",
        }
    }
}

impl core::fmt::Display for ModelType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prophet" => Ok(ModelType::Prophet),
            "arima" => Ok(ModelType::Arima),
            "lstm" => Ok(ModelType::Lstm),
            other => Err(ForecastError::UnsupportedModel(other.to_string())),
        }
    }
}

/// Smoothing factors for the arima-style strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Trend damping; 1.0 leaves the trend undamped.
    pub phi: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.1,
            phi: 1.0,
        }
    }
}

/// Caller-selected model plus its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlModelConfig {
    pub model_type: ModelType,
    /// Free-form settings passed through from the caller; not interpreted by
    /// the built-in strategies.
    #[serde(default)]
    pub parameters: Map<String, JsonValue>,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
}

impl MlModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            parameters: Map::new(),
            hyperparameters: Hyperparameters::default(),
        }
    }

    /// Parse a model name, rejecting unknown ones.
    pub fn parse(model_type: &str) -> Result<Self, ForecastError> {
        Ok(Self::new(model_type.parse()?))
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        let h = &self.hyperparameters;
        for (name, value) in [
            ("alpha", h.alpha),
            ("beta", h.beta),
            ("gamma", h.gamma),
            ("phi", h.phi),
        ] {
            if !(value.is_finite() && value > 0.0 && value <= 1.0) {
                return Err(ForecastError::InvalidConfig(format!(
                    "{name} must lie in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Build the strategy selected by `model_type`.
    pub fn strategy(&self) -> Box<dyn ForecastStrategy> {
        match self.model_type {
            ModelType::Prophet => Box::new(ProphetStrategy),
            ModelType::Arima => Box::new(ArimaStrategy::new(self.hyperparameters)),
            ModelType::Lstm => Box::new(LstmStrategy),
        }
    }
}

/// Engine-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastConfig {
    /// Products per batch; batches run one after another
    pub batch_size: usize,
    /// Upper bound on the engineered feature vector width
    pub max_features: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

impl ForecastConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Read overrides from `MEDSTOCK_FORECAST_BATCH_SIZE` and
    /// `MEDSTOCK_FORECAST_MAX_FEATURES`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(size) = env_usize("MEDSTOCK_FORECAST_BATCH_SIZE")? {
            config.batch_size = size;
        }
        if let Some(width) = env_usize("MEDSTOCK_FORECAST_MAX_FEATURES")? {
            config.max_features = width;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidConfig(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.max_features == 0 {
            return Err(ForecastError::InvalidConfig(
                "max_features must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_usize(name: &str) -> anyhow::Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{name} must be a positive integer, got '{raw}'"))?;
            Ok(Some(value))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_is_a_config_error() {
        let err = MlModelConfig::parse("transformer").unwrap_err();
        assert_eq!(err, ForecastError::UnsupportedModel("transformer".to_string()));
        assert!(err.is_config_error());
        assert_eq!(MlModelConfig::parse("LSTM").unwrap().model_type, ModelType::Lstm);
    }

    #[test]
    fn hyperparameters_default_to_documented_values() {
        let h = Hyperparameters::default();
        assert_eq!((h.alpha, h.beta, h.gamma, h.phi), (0.3, 0.1, 0.1, 1.0));
    }

    #[test]
    fn out_of_range_hyperparameter_is_rejected() {
        let config = MlModelConfig::new(ModelType::Arima).with_hyperparameters(Hyperparameters {
            alpha: 1.5,
            ..Hyperparameters::default()
        });
        assert!(matches!(config.validate(), Err(ForecastError::InvalidConfig(_))));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: MlModelConfig =
            serde_json::from_str(r#"{"model_type":"arima","hyperparameters":{"alpha":0.5}}"#)
                .unwrap();
        assert_eq!(config.model_type, ModelType::Arima);
        assert_eq!(config.hyperparameters.alpha, 0.5);
        assert_eq!(config.hyperparameters.beta, 0.1);
        assert!(config.parameters.is_empty());

        let bad = serde_json::from_str::<MlModelConfig>(r#"{"model_type":"gru"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(ForecastConfig::default().with_batch_size(0).validate().is_err());
        assert!(ForecastConfig::default().validate().is_ok());
    }
}
