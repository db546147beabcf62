//! `key=value` config file reader.
//!
//! Not dotenvy: its parser expands `$VAR` and strips quotes, while config.txt values such as
//! SUMMARY_HEADER are taken verbatim. dotenvy still loads `.env` for the TOKEN override.

use std::collections::HashMap;

/// Parses `key=value` lines. Blank lines and `#` comments are skipped, keys and values are trimmed,
/// the value keeps any further `=`. Lines without `=` are ignored. Later keys win.
pub fn parse_key_values(text: &str) -> HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
