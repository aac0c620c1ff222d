//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size =
                parse_size(v).map_err(|_| ConfigFileError::InvalidValue {
                    section: "cache".to_string(),
                    key: "memory_size".to_string(),
                    value: v.to_string(),
                    reason: "expected format like '4MB', '512KB', or '1GB'".to_string(),
                })?;
        }
    }

    // [dispatcher] section
    if let Some(section) = ini.section(Some("dispatcher")) {
        if let Some(v) = section.get("workers") {
            config.dispatcher.workers = parse_positive(v, "dispatcher", "workers")?;
        }
        if let Some(v) = section.get("record_pool_capacity") {
            config.dispatcher.record_pool_capacity =
                v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "dispatcher".to_string(),
                    key: "record_pool_capacity".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer".to_string(),
                })?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_positive(v, "download", "timeout")? as u64;
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.download.user_agent = v.to_string();
            }
        }
    }

    // [decode] section
    if let Some(section) = ini.section(Some("decode")) {
        if let Some(v) = section.get("max_alloc") {
            config.decode.max_alloc =
                parse_size(v).map_err(|_| ConfigFileError::InvalidValue {
                    section: "decode".to_string(),
                    key: "max_alloc".to_string(),
                    value: v.to_string(),
                    reason: "expected format like '512MB' or '1GB'".to_string(),
                })? as u64;
        }
    }

    Ok(config)
}

fn parse_positive(value: &str, section: &str, key: &str) -> Result<usize, ConfigFileError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a positive integer".to_string(),
        }),
    }
}
