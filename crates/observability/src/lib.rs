//! Tracing and logging setup shared by every binary embedding the
//! analytics core.

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls become no-ops. An invalid
/// `MEDSTOCK_LOG_FORMAT` falls back to JSON output.
pub fn init() {
    let config = LogConfig::from_env().unwrap_or_default();
    tracing::init_with(&config);
}

/// Log format and filter settings.
pub mod config;

/// Subscriber installation.
pub mod tracing;

pub use config::{LogConfig, LogFormat, UnknownLogFormat};
pub use self::tracing::init_with;
