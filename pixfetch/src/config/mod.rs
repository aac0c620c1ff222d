//! User configuration.
//!
//! Settings are read from an INI file, by default `~/.pixfetch/config.ini`.
//! Missing files and missing keys fall back to defaults, so an empty file
//! is a valid configuration.
//!
//! # Example
//!
//! ```
//! use pixfetch::config::{parse_size, ConfigFile};
//! use pixfetch::dispatcher::DispatcherConfig;
//!
//! let file = ConfigFile::default();
//! let config = DispatcherConfig::from(&file);
//! assert_eq!(config.workers(), file.dispatcher.workers);
//! assert_eq!(parse_size("4MB").unwrap(), file.cache.memory_size);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, DecodeSettings, DispatcherSettings, DownloadSettings,
};
pub use size::{format_size, parse_size, SizeParseError};
pub use writer::to_config_string;
