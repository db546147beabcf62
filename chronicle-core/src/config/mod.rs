//! Bot configuration: a `key=value` file turned into [`AppConfig`].

mod app_config;
mod file;


pub use app_config::{parse_utc_offset, AppConfig};
pub use file::parse_key_values;
