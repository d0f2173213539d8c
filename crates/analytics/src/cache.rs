//! In-process TTL cache for aggregation results.
//!
//! Entries are logically absent once `now - created_at > ttl`, whether or not
//! the background sweep has physically removed them yet. All access goes
//! through one lock, so the sweep and foreground reads never observe a
//! half-evicted entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::AnalyticsError;

/// A stored value with its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub ttl: TimeDelta,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > self.ttl
    }
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Fraction of `get` calls that returned a live value, in \[0, 1\].
    pub hit_rate: f64,
    /// Entries removed because they expired (on read or by the sweep).
    pub evictions: u64,
}

#[derive(Debug)]
struct Store<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Generic key/value store with per-entry TTL.
#[derive(Debug)]
pub struct TtlCache<V> {
    store: Mutex<Store<V>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(config: CacheConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self {
            store: Mutex::new(Store {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            config,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store<V>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under `key` with the configured default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            value,
            created_at: self.clock.now(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        };
        self.lock().entries.insert(key, entry);
    }

    /// Return the live value for `key`, removing it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut store = self.lock();

        let expired = match store.entries.get(key) {
            None => {
                store.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            store.entries.remove(key);
            store.evictions += 1;
            store.misses += 1;
            debug!(key, "cache entry expired on read");
            return None;
        }

        store.hits += 1;
        store.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Remove every entry, or only those whose key contains `fragment`.
    ///
    /// Returns the number of removed entries.
    pub fn clear(&self, fragment: Option<&str>) -> usize {
        let mut store = self.lock();
        let before = store.entries.len();
        match fragment {
            Some(fragment) => store.entries.retain(|key, _| !key.contains(fragment)),
            None => store.entries.clear(),
        }
        let removed = before - store.entries.len();
        info!(removed, fragment = ?fragment, "cleared cache entries");
        removed
    }

    /// Remove the entries whose key starts with `prefix`.
    pub fn clear_prefix(&self, prefix: &str) -> usize {
        let mut store = self.lock();
        let before = store.entries.len();
        store.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - store.entries.len();
        info!(removed, prefix, "cleared cache entries by prefix");
        removed
    }

    /// Drop every expired entry. This is what the background sweep runs.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.lock();
        let before = store.entries.len();
        store.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - store.entries.len();
        store.evictions += purged as u64;
        purged
    }

    /// Number of physically present entries (expired ones included until
    /// they are read or swept).
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let store = self.lock();
        let lookups = store.hits + store.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            store.hits as f64 / lookups as f64
        };
        CacheStats {
            entries: store.entries.len(),
            hits: store.hits,
            misses: store.misses,
            hit_rate,
            evictions: store.evictions,
        }
    }
}

impl<V: Clone + Send + 'static> TtlCache<V> {
    /// Start the periodic expiry sweep on the current tokio runtime.
    ///
    /// The sweep holds only a weak reference: it stops by itself once the
    /// cache is dropped. Call `CacheSweeper::stop` for an orderly shutdown.
    /// Fails with [`AnalyticsError::NoRuntime`] outside a tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<CacheSweeper, AnalyticsError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AnalyticsError::NoRuntime(e.to_string()))?;
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();
        let cache: Weak<Self> = Arc::downgrade(self);
        let interval = self.config.sweep_interval;

        let join = runtime.spawn(async move {
            info!(interval_secs = interval.as_secs_f64(), "cache sweep started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = signal.notified() => break,
                    _ = ticker.tick() => {
                        let Some(live) = cache.upgrade() else {
                            break;
                        };
                        let purged = live.purge_expired();
                        if purged > 0 {
                            debug!(purged, remaining = live.len(), "cache sweep purged expired entries");
                        }
                    }
                }
            }

            info!("cache sweep stopped");
        });

        Ok(CacheSweeper {
            shutdown,
            join: Some(join),
        })
    }
}

/// Handle to a running expiry sweep. Dropping it also requests shutdown.
#[derive(Debug)]
pub struct CacheSweeper {
    shutdown: Arc<Notify>,
    join: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    /// Signal the sweep and wait for it to finish.
    pub async fn stop(mut self) {
        self.shutdown.notify_one();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.shutdown.notify_one();
        }
    }
}
