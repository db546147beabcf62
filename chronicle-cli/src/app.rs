//! Wiring: stores, exporter, poster and driver built from [`AppConfig`], plus the command bodies.

use std::sync::Arc;

use anyhow::Result;
use chronicle_core::{AppConfig, Bot, Destination};
use chronicle_pipeline::{
    ingest_chain, Clock, DailyExporter, DayKey, PostResult, Schedule, ScheduleDriver,
    SummaryPoster, SystemClock,
};
use chronicle_telegram::run_dispatcher;
use storage::{MessageRepository, RunRecord, RunRecordRepository, RunRecordStore, SqlitePoolManager};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Shared handles for one process. Both repositories use the same SQLite pool.
pub struct App {
    pub config: AppConfig,
    pub messages: Arc<MessageRepository>,
    pub records: Arc<RunRecordRepository>,
    bot: Arc<dyn Bot>,
}

impl App {
    #[instrument(skip_all, fields(database_url = %config.database_url))]
    pub async fn open(config: AppConfig, bot: Arc<dyn Bot>) -> Result<Self> {
        let pool = SqlitePoolManager::new(&config.database_url).await?;
        let messages = Arc::new(MessageRepository::with_pool(pool.clone()).await?);
        let records = Arc::new(RunRecordRepository::with_pool(pool).await?);
        Ok(Self {
            config,
            messages,
            records,
            bot,
        })
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            time_export: self.config.time_export,
            time_post: self.config.time_post,
            action_timeout: self.config.action_timeout(),
            recovery_days: self.config.recovery_days,
        }
    }

    pub fn driver(&self) -> ScheduleDriver {
        let exporter = DailyExporter::new(
            self.messages.clone(),
            &self.config.messages_dir,
            self.config.max_file_size,
            self.config.utc_offset,
        );
        let poster = SummaryPoster::new(
            self.bot.clone(),
            &self.config.messages_dir,
            Destination::new(self.config.target_chat_id, Some(self.config.summary_topic_id)),
            self.config.max_summary_size,
        )
        .with_header(self.config.summary_header.clone());

        ScheduleDriver::new(
            Arc::new(exporter),
            Arc::new(poster),
            self.records.clone(),
            self.schedule(),
        )
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(SystemClock::new(self.config.utc_offset))
    }

    /// Archives messages and runs the schedule until Ctrl-C.
    pub async fn run(self, teloxide_bot: teloxide::Bot) -> Result<()> {
        let clock = self.clock();
        let mut driver = self.driver();
        driver.recover(DayKey::new(clock.now().date_naive())).await?;

        let shutdown = CancellationToken::new();
        let driver_task = tokio::spawn(driver.run(
            clock,
            self.config.tick_interval(),
            shutdown.clone(),
        ));

        let ctrl_c_token = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, shutting down");
                    ctrl_c_token.cancel();
                }
                Err(e) => error!(error = %e, "Cannot listen for Ctrl-C"),
            }
        });

        let chain = ingest_chain(&self.config, self.messages.clone());
        info!(
            target_chat_id = self.config.target_chat_id,
            ignored_topics = ?self.config.ignored_topic_ids,
            "Archiving messages"
        );
        let result = run_dispatcher(teloxide_bot, chain, shutdown.clone()).await;

        shutdown.cancel();
        driver_task.await?;
        info!("Stopped");
        result
    }

    /// Exports `day` now and records it.
    pub async fn export(&self, day: DayKey) -> Result<()> {
        let mut driver = self.driver();
        driver.refresh_day(day).await?;
        let artifact = driver.export_day(day).await?;
        println!(
            "Exported {}: {} message(s) in {} part(s) under {}",
            day,
            artifact.message_count,
            artifact.parts.len(),
            artifact.dir.display()
        );
        Ok(())
    }

    /// Posts `day`'s summary now. Returns whether it was posted.
    pub async fn post(&self, day: DayKey) -> Result<bool> {
        let mut driver = self.driver();
        driver.refresh_day(day).await?;
        let result = driver.post_day(day).await?;
        match &result {
            PostResult::Posted { chunks } => println!("Posted summary of {} in {} chunk(s)", day, chunks),
            PostResult::NotReady => println!("No summary for {} yet", day),
            PostResult::Invalid { reason } => println!("Summary of {} not posted: {}", day, reason),
        }
        Ok(result.posted())
    }

    /// Run records of the last `days` days before `today`, oldest first.
    pub async fn status(&self, today: DayKey, days: u32) -> Result<Vec<RunRecord>> {
        Ok(self
            .records
            .load_since(today.days_before(days).date())
            .await?)
    }

    pub async fn print_status(&self, days: u32) -> Result<()> {
        let today = DayKey::new(self.clock().now().date_naive());
        let records = self.status(today, days).await?;

        println!("Archived messages: {}", self.messages.count().await?);
        if let Some(latest) = self.messages.latest().await? {
            println!(
                "Latest: {} by {}",
                latest.sent_at.with_timezone(&self.config.utc_offset).format("%d.%m.%Y %H:%M"),
                latest.author
            );
        }

        if records.is_empty() {
            println!("No runs in the last {} day(s).", days);
            return Ok(());
        }

        println!();
        println!("{:<12} {:<9} {:<7}", "day", "exported", "posted");
        println!("{}", "-".repeat(30));
        for record in &records {
            println!(
                "{:<12} {:<9} {:<7}",
                DayKey::new(record.day).to_string(),
                yes_no(record.exported),
                yes_no(record.posted)
            );
        }
        Ok(())
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
