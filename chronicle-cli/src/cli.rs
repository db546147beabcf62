//! CLI parser and config loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chronicle_core::AppConfig;
use chronicle_pipeline::DayKey;
use clap::{Parser, Subcommand};

pub const DEFAULT_CONFIG_PATH: &str = "config.txt";

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Archive a Telegram chat, export each day, post the daily summary", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archive messages and run the daily export/post schedule until Ctrl-C.
    Run {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Overrides TOKEN from the config file.
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Export one day now (DD.MM.YYYY) and record it.
    Export {
        #[arg(short, long, value_parser = parse_day)]
        date: DayKey,
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Post one day's summary now (DD.MM.YYYY). The day must be exported.
    Post {
        #[arg(short, long, value_parser = parse_day)]
        date: DayKey,
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Show run records of the last N days and the archive size.
    Status {
        #[arg(short = 'n', long, default_value = "7")]
        days: u32,
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

fn parse_day(raw: &str) -> std::result::Result<DayKey, String> {
    DayKey::parse(raw).ok_or_else(|| format!("expected DD.MM.YYYY, got '{}'", raw))
}

/// Loads and validates the config file. `token` overrides TOKEN.
pub fn load_config(path: &Path, token: Option<String>) -> Result<AppConfig> {
    let config = AppConfig::load(path, token)
        .with_context(|| format!("Load config from {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
