//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[cache]
; In-memory cache for decoded images (default: 4MB)
; Bounded by decoded pixel bytes; least recently used entries go first
; Supports: KB, MB, GB suffixes (e.g., 512KB, 4MB, 64MB)
memory_size = {}

[dispatcher]
; Number of fetch-decode worker threads (default: 8)
workers = {}
; Finished request records kept for reuse (default: 64)
record_pool_capacity = {}

[download]
; Timeout in seconds for HTTP requests (default: 30)
timeout = {}
; User-Agent header sent with every request
user_agent = {}

[decode]
; Largest allocation a single decode may make (default: 512MB)
; Images needing more fail and the memory cache is cleared
max_alloc = {}
"#,
        format_size(config.cache.memory_size),
        config.dispatcher.workers,
        config.dispatcher.record_pool_capacity,
        config.download.timeout,
        config.download.user_agent,
        format_size(usize::try_from(config.decode.max_alloc).unwrap_or(usize::MAX)),
    )
}
