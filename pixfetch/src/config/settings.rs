//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Memory cache settings
    pub cache: CacheSettings,
    /// Worker and record pool sizing
    pub dispatcher: DispatcherSettings,
    /// HTTP transport settings
    pub download: DownloadSettings,
    /// Decoder limits
    pub decode: DecodeSettings,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Memory cache size in bytes
    pub memory_size: usize,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Number of fetch-decode worker threads
    pub workers: usize,
    /// Retired request records kept for reuse
    pub record_pool_capacity: usize,
}

/// Download configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Timeout in seconds for HTTP requests.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

/// Decode configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeSettings {
    /// Largest allocation the decoder may make, in bytes. Images that need
    /// more fail with resource exhaustion.
    pub max_alloc: u64,
}
