//! `medstock-analytics`
//!
//! **Responsibility:** hierarchical, cached roll-up of product consumption
//! records into summary metrics.
//!
//! Data flow: records → `HierarchyManager` (caller scope, level membership)
//! → `AggregationEngine` (cache or compute) → `MetricsCalculator` → caller.
//! No IO happens here; records and caller identity are supplied by the
//! caller.

pub mod aggregation;
pub mod cache;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod hierarchy;
pub mod metrics;

pub use aggregation::AggregationEngine;
pub use cache::{CacheEntry, CacheStats, CacheSweeper, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use directory::{FacilityDirectory, InMemoryFacilityDirectory};
pub use error::AnalyticsError;
pub use hierarchy::HierarchyManager;
pub use metrics::{AggregatedMetrics, MetricsCalculator, MetricsCompute, performance_score};
