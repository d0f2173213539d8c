//! Analytics configuration.

use std::time::Duration;

use anyhow::Context;

use crate::error::AnalyticsError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied by `set` when no explicit TTL is given
    pub default_ttl: Duration,
    /// How often the background sweep purges expired entries
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheConfig {
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Read overrides from `MEDSTOCK_CACHE_TTL_SECS` and
    /// `MEDSTOCK_CACHE_SWEEP_SECS`; unset variables keep the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(secs) = env_u64("MEDSTOCK_CACHE_TTL_SECS")? {
            config.default_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("MEDSTOCK_CACHE_SWEEP_SECS")? {
            config.sweep_interval = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.default_ttl.is_zero() {
            return Err(AnalyticsError::InvalidConfig(
                "default_ttl must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(AnalyticsError::InvalidConfig(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_u64(name: &str) -> anyhow::Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{name} must be an integer number of seconds, got '{raw}'"))?;
            Ok(Some(value))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {name}")),
    }
}
