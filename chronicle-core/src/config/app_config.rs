//! AppConfig: everything the bot needs, loaded from a `key=value` file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, NaiveTime};

use super::file::parse_key_values;
use crate::error::{ChronicleError, Result};

const DEFAULT_UTC_OFFSET: &str = "+03:00";
const DEFAULT_DATABASE_URL: &str = "messages.db";
const DEFAULT_MESSAGES_DIR: &str = "messages";
const DEFAULT_LOG_FILE: &str = "logs/chronicle.log";
const DEFAULT_TICK_INTERVAL_SECS: u64 = 30;
const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RECOVERY_DAYS: u32 = 7;

/// Application config. Use [`AppConfig::load`] then [`AppConfig::validate`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TOKEN
    pub token: String,
    /// TARGET_CHAT_ID: the only chat that is archived and posted to.
    pub target_chat_id: i64,
    /// SUMMARY_TOPIC_ID: forum topic receiving the daily summary.
    pub summary_topic_id: i32,
    /// TIME_EXPORT (local)
    pub time_export: NaiveTime,
    /// TIME_POST (local)
    pub time_post: NaiveTime,
    /// MAX_FILE_SIZE in bytes
    pub max_file_size: usize,
    /// MAX_SUMMARY_SIZE in bytes
    pub max_summary_size: usize,
    /// IGNORED_TOPIC_IDS: topics skipped by ingestion.
    pub ignored_topic_ids: Vec<i32>,
    /// UTC_OFFSET of the local calendar.
    pub utc_offset: FixedOffset,
    pub database_url: String,
    pub messages_dir: PathBuf,
    pub log_file: String,
    pub tick_interval_secs: u64,
    pub action_timeout_secs: u64,
    pub recovery_days: u32,
    /// TELEGRAM_API_URL
    pub telegram_api_url: Option<String>,
    /// SUMMARY_HEADER; `{date}` expands to `DD.MM`.
    pub summary_header: Option<String>,
}

impl AppConfig {
    /// Reads and parses the config file. `token` overrides TOKEN if provided.
    pub fn load(path: impl AsRef<Path>, token: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChronicleError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text, token)
    }

    /// Parses config text. Value types are checked here; ranges in [`AppConfig::validate`].
    pub fn parse(text: &str, token: Option<String>) -> Result<Self> {
        let values = parse_key_values(text);

        let token = match token {
            Some(token) => token,
            None => required(&values, "TOKEN")?.to_string(),
        };

        Ok(Self {
            token,
            target_chat_id: parse_number(&values, "TARGET_CHAT_ID")?,
            summary_topic_id: parse_number(&values, "SUMMARY_TOPIC_ID")?,
            time_export: parse_time(&values, "TIME_EXPORT")?,
            time_post: parse_time(&values, "TIME_POST")?,
            max_file_size: parse_number(&values, "MAX_FILE_SIZE")?,
            max_summary_size: parse_number(&values, "MAX_SUMMARY_SIZE")?,
            ignored_topic_ids: values
                .get("IGNORED_TOPIC_IDS")
                .map(|v| parse_id_list(v))
                .unwrap_or_default(),
            utc_offset: parse_utc_offset(optional(&values, "UTC_OFFSET").unwrap_or(DEFAULT_UTC_OFFSET))?,
            database_url: optional(&values, "DATABASE_URL")
                .unwrap_or(DEFAULT_DATABASE_URL)
                .to_string(),
            messages_dir: PathBuf::from(
                optional(&values, "MESSAGES_DIR").unwrap_or(DEFAULT_MESSAGES_DIR),
            ),
            log_file: optional(&values, "LOG_FILE")
                .unwrap_or(DEFAULT_LOG_FILE)
                .to_string(),
            tick_interval_secs: parse_optional_number(&values, "TICK_INTERVAL_SECS")?
                .unwrap_or(DEFAULT_TICK_INTERVAL_SECS),
            action_timeout_secs: parse_optional_number(&values, "ACTION_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_ACTION_TIMEOUT_SECS),
            recovery_days: parse_optional_number(&values, "RECOVERY_DAYS")?
                .unwrap_or(DEFAULT_RECOVERY_DAYS),
            telegram_api_url: optional(&values, "TELEGRAM_API_URL").map(String::from),
            summary_header: optional(&values, "SUMMARY_HEADER").map(String::from),
        })
    }

    /// Checks ranges and the API URL. Call after load() to fail fast before startup.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(config_error("TOKEN must not be empty"));
        }
        if self.max_file_size == 0 {
            return Err(config_error("MAX_FILE_SIZE must be positive"));
        }
        if self.max_summary_size == 0 {
            return Err(config_error("MAX_SUMMARY_SIZE must be positive"));
        }
        if !(1..=3600).contains(&self.tick_interval_secs) {
            return Err(config_error("TICK_INTERVAL_SECS must be within 1..=3600"));
        }
        if self.action_timeout_secs == 0 {
            return Err(config_error("ACTION_TIMEOUT_SECS must be positive"));
        }
        if self.recovery_days == 0 {
            return Err(config_error("RECOVERY_DAYS must be positive"));
        }
        if let Some(ref url) = self.telegram_api_url {
            if reqwest::Url::parse(url).is_err() {
                return Err(config_error(&format!(
                    "TELEGRAM_API_URL is set but not a valid URL: {}",
                    url
                )));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}

fn config_error(msg: &str) -> ChronicleError {
    ChronicleError::Config(msg.to_string())
}

fn optional<'a>(values: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    values
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn required<'a>(values: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    optional(values, key).ok_or_else(|| config_error(&format!("{} not set", key)))
}

fn parse_number<T: std::str::FromStr>(values: &HashMap<String, String>, key: &str) -> Result<T> {
    let raw = required(values, key)?;
    raw.parse()
        .map_err(|_| config_error(&format!("{} is not a valid number: {}", key, raw)))
}

fn parse_optional_number<T: std::str::FromStr>(
    values: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>> {
    match optional(values, key) {
        Some(_) => parse_number(values, key).map(Some),
        None => Ok(None),
    }
}

fn parse_time(values: &HashMap<String, String>, key: &str) -> Result<NaiveTime> {
    let raw = required(values, key)?;
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| config_error(&format!("{} must be HH:MM, got {}", key, raw)))
}

/// Comma separated ids; blanks and non-numeric entries are skipped.
fn parse_id_list(raw: &str) -> Vec<i32> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

/// Parses `+HH:MM` / `-HH:MM` with chrono's offset parser.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    raw.parse::<FixedOffset>().map_err(|e| {
        config_error(&format!(
            "UTC_OFFSET must be +HH:MM or -HH:MM, got {}: {}",
            raw, e
        ))
    })
}
