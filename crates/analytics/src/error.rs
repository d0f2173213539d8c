use thiserror::Error;

/// Errors raised by the aggregation layer.
///
/// Data-shape problems never show up here (they degrade to zeroed metrics);
/// these are programmer/configuration errors only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("duplicate aggregation level id '{0}' in a single request")]
    DuplicateLevel(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("aggregation task failed: {0}")]
    TaskFailed(String),

    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
}
