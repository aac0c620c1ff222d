//! In-memory cache with LRU eviction.

use super::stats::CacheStats;
use super::types::{CacheError, Weighted};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Entry in the memory cache.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// Cached value
    value: V,
    /// Weight of the value, captured at insertion time
    size: usize,
    /// Access tick for LRU ordering
    last_accessed: u64,
}

/// Everything guarded by the cache lock.
///
/// Map, recency index, running size and statistics live behind a single
/// lock so a reader never observes a size that disagrees with the map.
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Access tick → key, oldest first
    recency: BTreeMap<u64, String>,
    current_size_bytes: usize,
    next_tick: u64,
    stats: CacheStats,
}

impl<V> CacheState<V> {
    fn tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.last_accessed);
        self.current_size_bytes = self.current_size_bytes.saturating_sub(entry.size);
        Some(entry)
    }

    fn sync_stats(&mut self) {
        let (size, count) = (self.current_size_bytes, self.entries.len());
        self.stats.update_size(size, count);
    }
}

/// In-memory cache for decoded images.
///
/// Bounded by the total [`Weighted::weight`] of its values. `get` counts as
/// an access, so eviction order is strictly least recently accessed first.
pub struct MemoryCache<V> {
    state: Mutex<CacheState<V>>,
    /// Maximum size in bytes
    max_size_bytes: usize,
}

impl<V: Weighted + Clone> MemoryCache<V> {
    /// Create a new memory cache with the given size limit.
    ///
    /// # Arguments
    ///
    /// * `max_size_bytes` - Maximum total weight of cached values
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: BTreeMap::new(),
                current_size_bytes: 0,
                next_tick: 0,
                stats: CacheStats::new(),
            }),
            max_size_bytes,
        }
    }

    /// Get a cached value.
    ///
    /// Returns `Some(value)` on a hit and refreshes the entry's recency.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();
        let tick = state.tick();

        let Some(entry) = state.entries.get_mut(key) else {
            state.stats.record_miss();
            return None;
        };

        let previous = std::mem::replace(&mut entry.last_accessed, tick);
        let value = entry.value.clone();
        state.recency.remove(&previous);
        state.recency.insert(tick, key.to_string());
        state.stats.record_hit();

        Some(value)
    }

    /// Put a value into the cache, replacing any previous value for `key`.
    ///
    /// Evicts least recently used entries until the new value fits. A value
    /// heavier than the whole cache is rejected and nothing is evicted.
    pub fn put(&self, key: impl Into<String>, value: V) -> Result<(), CacheError> {
        let key = key.into();
        let size = value.weight();

        if size > self.max_size_bytes {
            return Err(CacheError::EntryTooLarge {
                size,
                limit: self.max_size_bytes,
            });
        }

        let mut state = self.state.lock();
        state.remove_entry(&key);

        let mut evicted = 0;
        while state.current_size_bytes + size > self.max_size_bytes {
            let Some((_, oldest)) = state.recency.pop_first() else {
                break;
            };
            if let Some(entry) = state.entries.remove(&oldest) {
                state.current_size_bytes = state.current_size_bytes.saturating_sub(entry.size);
                evicted += 1;
            }
        }
        if evicted > 0 {
            debug!(evicted, "Memory cache evicted LRU entries");
            state.stats.record_evictions(evicted);
        }

        let tick = state.tick();
        state.recency.insert(tick, key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                value,
                size,
                last_accessed: tick,
            },
        );
        state.current_size_bytes += size;
        state.stats.record_insertion();
        state.sync_stats();

        Ok(())
    }

    /// Remove a single entry, returning its value.
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();
        let entry = state.remove_entry(key)?;
        state.sync_stats();
        Some(entry.value)
    }

    /// Drop every entry unconditionally.
    pub fn evict_all(&self) {
        let mut state = self.state.lock();
        let count = state.entries.len();
        state.entries.clear();
        state.recency.clear();
        state.current_size_bytes = 0;
        state.stats.record_evictions(count);
        state.sync_stats();

        info!(evicted = count, "Memory cache cleared");
    }

    /// Check if a key exists in the cache without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Get the current number of entries in the cache.
    pub fn entry_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Get the current size of the cache in bytes.
    pub fn size_bytes(&self) -> usize {
        self.state.lock().current_size_bytes
    }

    /// Get the maximum size of the cache in bytes.
    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats.clone()
    }
}
