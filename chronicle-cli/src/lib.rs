//! # chronicle-cli
//!
//! Argument parsing, config loading and the wiring of stores, pipeline and Telegram transport.

pub mod app;
pub mod cli;

pub use app::App;
pub use cli::{load_config, Cli, Commands, DEFAULT_CONFIG_PATH};
