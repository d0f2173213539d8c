//! Cache-or-compute aggregation across hierarchy levels.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use medstock_auth::Caller;
use medstock_core::{AggregationLevel, LevelType, ProductRecord};

use crate::cache::{CacheStats, TtlCache};
use crate::error::AnalyticsError;
use crate::hierarchy::HierarchyManager;
use crate::metrics::{AggregatedMetrics, MetricsCalculator, MetricsCompute};

/// Orchestrates hierarchy partitioning, caching and metric computation.
///
/// Cheap to clone: all state is shared behind `Arc`s. Cache keys start
/// with `"{level.id}:{level.type}"`, so concurrent aggregation of distinct
/// levels never contends on the same entry. Results computed over a
/// caller's scoped records also carry the caller's scope in the key.
#[derive(Clone)]
pub struct AggregationEngine {
    cache: Arc<TtlCache<AggregatedMetrics>>,
    hierarchy: HierarchyManager,
    calculator: Arc<dyn MetricsCompute>,
}

impl core::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("cache", &self.cache.stats())
            .field("hierarchy", &self.hierarchy)
            .finish_non_exhaustive()
    }
}

impl AggregationEngine {
    pub fn new(cache: Arc<TtlCache<AggregatedMetrics>>, hierarchy: HierarchyManager) -> Self {
        Self {
            cache,
            hierarchy,
            calculator: Arc::new(MetricsCalculator),
        }
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn MetricsCompute>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn hierarchy(&self) -> &HierarchyManager {
        &self.hierarchy
    }

    /// Metrics for `records` at `level`.
    ///
    /// With `use_cache`, a live cached value for the level is returned as-is.
    /// Without it the cache is not consulted, but the fresh result still
    /// replaces whatever was stored.
    pub fn aggregate_by_level(
        &self,
        records: &[ProductRecord],
        level: &AggregationLevel,
        use_cache: bool,
    ) -> AggregatedMetrics {
        self.cached_metrics(records, level.cache_key(), use_cache)
    }

    fn cached_metrics(
        &self,
        records: &[ProductRecord],
        key: String,
        use_cache: bool,
    ) -> AggregatedMetrics {
        if use_cache {
            if let Some(cached) = self.cache.get(&key) {
                debug!(key = %key, "aggregation cache hit");
                return cached;
            }
        }

        let metrics = self.calculator.compute_metrics(records);
        self.cache.set(key.clone(), metrics);
        debug!(key = %key, products = records.len(), "aggregation computed");
        metrics
    }

    /// Partition once, then aggregate every level concurrently.
    ///
    /// Returns exactly one entry per level id. All per-level tasks complete
    /// before the map is returned.
    pub async fn aggregate_hierarchy(
        &self,
        records: &[ProductRecord],
        levels: &[AggregationLevel],
        caller: &Caller,
    ) -> Result<HashMap<String, AggregatedMetrics>, AnalyticsError> {
        let mut seen = HashSet::with_capacity(levels.len());
        for level in levels {
            if !seen.insert(level.id.as_str()) {
                return Err(AnalyticsError::DuplicateLevel(level.id.clone()));
            }
        }

        let mut groups = self.hierarchy.group_by_level(records, levels, caller);

        let mut tasks = JoinSet::new();
        for level in levels {
            let subset = groups.remove(&level.id).unwrap_or_default();
            let engine = self.clone();
            let level_id = level.id.clone();
            let key = format!("{}:{}", level.cache_key(), scope_fingerprint(caller));
            tasks.spawn(async move {
                let metrics = engine.cached_metrics(&subset, key, true);
                (level_id, metrics)
            });
        }

        let mut results = HashMap::with_capacity(levels.len());
        while let Some(joined) = tasks.join_next().await {
            let (level_id, metrics) =
                joined.map_err(|e| AnalyticsError::TaskFailed(e.to_string()))?;
            results.insert(level_id, metrics);
        }

        info!(
            levels = results.len(),
            records = records.len(),
            role = %caller.role,
            "hierarchy aggregation complete"
        );

        Ok(results)
    }

    /// Invalidate one level's cached results (for every caller scope), or
    /// everything.
    pub fn clear_cache(&self, level_id: Option<&str>) -> usize {
        match level_id {
            Some(id) => self.cache.clear_prefix(&format!("{id}:")),
            None => self.cache.clear(None),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// `"{tier}/{assignment}"`, e.g. `facility/F2` or `national/*`.
fn scope_fingerprint(caller: &Caller) -> String {
    let tier = caller.tier();
    let scope = &caller.scope;
    let assignment = match tier {
        LevelType::National => Some("*"),
        LevelType::Facility => scope.facility_id.as_ref().map(|id| id.as_str()),
        LevelType::Zonal => scope.zone_id.as_ref().map(|id| id.as_str()),
        LevelType::Regional => scope.region_id.as_ref().map(|id| id.as_str()),
    };
    format!("{tier}/{}", assignment.unwrap_or("-"))
}
