//! Default values for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::settings::*;

/// Default memory cache size (4MB).
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = crate::dispatcher::DEFAULT_CACHE_SIZE_BYTES;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = crate::executor::DEFAULT_WORKER_COUNT;

/// Default number of pooled request records.
pub const DEFAULT_RECORD_POOL_CAPACITY: usize = crate::task::DEFAULT_RECORD_POOL_CAPACITY;

/// Default HTTP timeout in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = crate::provider::DEFAULT_TIMEOUT_SECS;

/// Default decoder allocation limit (512MB).
pub const DEFAULT_DECODE_MAX_ALLOC: u64 = crate::decode::DEFAULT_MAX_DECODE_ALLOC;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                memory_size: DEFAULT_MEMORY_CACHE_SIZE,
            },
            dispatcher: DispatcherSettings {
                workers: DEFAULT_WORKERS,
                record_pool_capacity: DEFAULT_RECORD_POOL_CAPACITY,
            },
            download: DownloadSettings {
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                user_agent: crate::provider::DEFAULT_USER_AGENT.to_string(),
            },
            decode: DecodeSettings {
                max_alloc: DEFAULT_DECODE_MAX_ALLOC,
            },
        }
    }
}
