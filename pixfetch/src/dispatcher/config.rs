//! Dispatcher configuration.

use crate::config::ConfigFile;
use crate::executor::DEFAULT_WORKER_COUNT;
use crate::task::DEFAULT_RECORD_POOL_CAPACITY;

/// Default memory cache size (4 MB).
pub const DEFAULT_CACHE_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Sizing for a [`Dispatcher`](super::Dispatcher).
///
/// # Example
///
/// ```
/// use pixfetch::dispatcher::DispatcherConfig;
///
/// let config = DispatcherConfig::default();
/// assert_eq!(config.workers(), 8);
/// assert_eq!(config.cache_size_bytes(), 4 * 1024 * 1024);
///
/// let config = DispatcherConfig::new()
///     .with_workers(2)
///     .with_cache_size(64 * 1024 * 1024);
/// assert_eq!(config.workers(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Number of worker threads
    workers: usize,
    /// Memory cache bound in bytes
    cache_size_bytes: usize,
    /// Retired records kept for reuse
    record_pool_capacity: usize,
}

impl DispatcherConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads. Zero is raised to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the memory cache bound in bytes.
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size_bytes = bytes;
        self
    }

    /// Set how many retired records are kept for reuse.
    pub fn with_record_pool_capacity(mut self, capacity: usize) -> Self {
        self.record_pool_capacity = capacity;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cache_size_bytes(&self) -> usize {
        self.cache_size_bytes
    }

    pub fn record_pool_capacity(&self) -> usize {
        self.record_pool_capacity
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            cache_size_bytes: DEFAULT_CACHE_SIZE_BYTES,
            record_pool_capacity: DEFAULT_RECORD_POOL_CAPACITY,
        }
    }
}

impl From<&ConfigFile> for DispatcherConfig {
    fn from(config: &ConfigFile) -> Self {
        Self::new()
            .with_workers(config.dispatcher.workers)
            .with_cache_size(config.cache.memory_size)
            .with_record_pool_capacity(config.dispatcher.record_pool_capacity)
    }
}
