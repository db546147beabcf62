//! chronicle CLI: archive the target chat and run the daily schedule, or export/post/inspect one day.

use std::sync::Arc;

use anyhow::Result;
use chronicle_cli::{load_config, App, Cli, Commands};
use chronicle_core::init_tracing;
use chronicle_telegram::{build_teloxide_bot, TelegramBotAdapter};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let (config_path, token) = match &cli.command {
        Commands::Run { config, token } => (config, token.clone()),
        Commands::Export { config, .. }
        | Commands::Post { config, .. }
        | Commands::Status { config, .. } => (config, None),
    };
    let config = load_config(config_path, token)?;
    init_tracing(&config.log_file)?;

    info!(
        config = %config_path.display(),
        time_export = %config.time_export,
        time_post = %config.time_post,
        utc_offset = %config.utc_offset,
        "Configuration loaded"
    );

    let adapter = TelegramBotAdapter::new(build_teloxide_bot(&config)?, config.action_timeout());
    let teloxide_bot = adapter.inner().clone();
    let app = App::open(config, Arc::new(adapter)).await?;

    match cli.command {
        Commands::Run { .. } => app.run(teloxide_bot).await,
        Commands::Export { date, .. } => app.export(date).await,
        Commands::Post { date, .. } => {
            if !app.post(date).await? {
                anyhow::bail!("summary of {} was not posted", date);
            }
            Ok(())
        }
        Commands::Status { days, .. } => app.print_status(days).await,
    }
}
