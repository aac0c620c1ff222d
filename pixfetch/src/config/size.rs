//! Byte sizes in the config file.
//!
//! `[cache] memory_size` and `[decode] max_alloc` are written as a whole
//! number with an optional binary unit: `4MB`, `512 MB`, `64k` or plain
//! bytes. Fractions and units above gigabytes are rejected.

use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected a whole number with an optional KB, MB or GB unit")]
pub struct SizeParseError {
    input: String,
}

/// Units from largest to smallest; `format_size` picks the first that
/// divides evenly.
const UNITS: [(&str, usize); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];

/// Parse a size such as `4MB` into bytes.
///
/// Units are case-insensitive, the trailing `B` is optional and spaces
/// between number and unit are allowed.
///
/// ```
/// use pixfetch::config::parse_size;
///
/// assert_eq!(parse_size("4MB").unwrap(), 4 * 1024 * 1024);
/// assert_eq!(parse_size("64 k").unwrap(), 64 * 1024);
/// assert_eq!(parse_size("1000").unwrap(), 1000);
/// ```
pub fn parse_size(input: &str) -> Result<usize, SizeParseError> {
    let invalid = || SizeParseError {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(digits_end);
    if number.is_empty() {
        return Err(invalid());
    }

    let unit = unit.trim().to_ascii_uppercase();
    let multiplier = match unit.strip_suffix('B').unwrap_or(&unit) {
        "" => 1,
        "K" => 1 << 10,
        "M" => 1 << 20,
        "G" => 1 << 30,
        _ => return Err(invalid()),
    };

    number
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

/// Format bytes with the largest unit that divides them exactly, so the
/// config writer never loses precision.
///
/// ```
/// use pixfetch::config::format_size;
///
/// assert_eq!(format_size(4 * 1024 * 1024), "4MB");
/// assert_eq!(format_size(1536), "1536");
/// ```
pub fn format_size(bytes: usize) -> String {
    UNITS
        .iter()
        .find(|(_, unit)| bytes >= *unit && bytes % unit == 0)
        .map(|(suffix, unit)| format!("{}{}", bytes / unit, suffix))
        .unwrap_or_else(|| bytes.to_string())
}
