//! Schedule driver: fires the export and the post for "yesterday" once local time passes
//! TIME_EXPORT / TIME_POST, at most once per successful transition, surviving restarts.
//! Older days inside the recovery window that are still behind (missed during an outage, or
//! whose summary came late) are caught up on every tick, oldest first.
//!
//! Per day the state moves `Pending → Exported → Posted`. A transition is persisted to the
//! [`RunRecordStore`] right after its action succeeds and before the in-memory state changes;
//! failures leave the state as it was so the next tick retries.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime};
use storage::{RunRecord, RunRecordStore};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::clock::Clock;
use crate::day_key::DayKey;
use crate::error::{PipelineError, Result};
use crate::exporter::{DayExporter, ExportArtifact};
use crate::poster::{DayPoster, PostResult};

/// Where a day is in its export/post cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Pending,
    Exported,
    Posted,
}

impl DayState {
    fn from_record(record: &RunRecord) -> Self {
        match (record.exported, record.posted) {
            (true, true) => DayState::Posted,
            (true, false) => DayState::Exported,
            _ => DayState::Pending,
        }
    }
}

/// Times and bounds the driver runs with.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub time_export: NaiveTime,
    pub time_post: NaiveTime,
    /// Upper bound on one export or one post attempt.
    pub action_timeout: Duration,
    /// Days of run records kept in memory and reloaded on startup.
    pub recovery_days: u32,
}

/// What one action attempt during a tick ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Exported { parts: usize },
    Posted { chunks: usize },
    NotReady,
    Invalid(String),
    Failed(String),
}

/// The actions one tick attempted for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub day: DayKey,
    pub export: Option<ActionOutcome>,
    pub post: Option<ActionOutcome>,
}

/// What a tick did, for logging and tests. Only days with an attempted action are listed,
/// oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub days: Vec<DayReport>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.days.is_empty()
    }

    pub fn export_of(&self, day: DayKey) -> Option<&ActionOutcome> {
        self.day(day).and_then(|r| r.export.as_ref())
    }

    pub fn post_of(&self, day: DayKey) -> Option<&ActionOutcome> {
        self.day(day).and_then(|r| r.post.as_ref())
    }

    fn day(&self, day: DayKey) -> Option<&DayReport> {
        self.days.iter().find(|r| r.day == day)
    }
}

pub struct ScheduleDriver {
    exporter: Arc<dyn DayExporter>,
    poster: Arc<dyn DayPoster>,
    records: Arc<dyn RunRecordStore>,
    schedule: Schedule,
    states: BTreeMap<DayKey, DayState>,
}

impl ScheduleDriver {
    pub fn new(
        exporter: Arc<dyn DayExporter>,
        poster: Arc<dyn DayPoster>,
        records: Arc<dyn RunRecordStore>,
        schedule: Schedule,
    ) -> Self {
        Self {
            exporter,
            poster,
            records,
            schedule,
            states: BTreeMap::new(),
        }
    }

    /// Reloads run records for the last `recovery_days` days before `today`. Returns how many were loaded.
    #[instrument(skip(self))]
    pub async fn recover(&mut self, today: DayKey) -> Result<usize> {
        let first = today.days_before(self.schedule.recovery_days);
        let records = self.records.load_since(first.date()).await?;

        self.states.clear();
        for record in &records {
            self.states
                .insert(DayKey::new(record.day), DayState::from_record(record));
        }

        info!(
            loaded = records.len(),
            since = %first,
            "Recovered run records"
        );
        Ok(records.len())
    }

    /// Reloads one day's record from the store, e.g. before a manual action on an old day.
    pub async fn refresh_day(&mut self, day: DayKey) -> Result<DayState> {
        let state = self
            .records
            .get(day.date())
            .await?
            .map(|r| DayState::from_record(&r))
            .unwrap_or(DayState::Pending);
        self.states.insert(day, state);
        Ok(state)
    }

    pub fn state(&self, day: DayKey) -> DayState {
        self.states.get(&day).copied().unwrap_or(DayState::Pending)
    }

    /// Exports `day` and records it. Re-exporting an exported or posted day overwrites the parts
    /// and keeps its state.
    pub async fn export_day(&mut self, day: DayKey) -> Result<ExportArtifact> {
        let artifact = self
            .bounded("export", self.exporter.export(day))
            .await?;
        self.records.mark_exported(day.date()).await?;
        if self.state(day) == DayState::Pending {
            self.states.insert(day, DayState::Exported);
        }
        Ok(artifact)
    }

    /// Posts `day`'s summary and records it when every chunk went out. Refuses a day that is
    /// not exported.
    pub async fn post_day(&mut self, day: DayKey) -> Result<PostResult> {
        if self.state(day) == DayState::Pending {
            return Err(PipelineError::NotExported(day));
        }
        let result = self.bounded("post", self.poster.post(day)).await?;
        if result.posted() {
            self.records.mark_posted(day.date()).await?;
            self.states.insert(day, DayState::Posted);
        }
        Ok(result)
    }

    async fn bounded<T>(
        &self,
        action: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.schedule.action_timeout, fut)
            .await
            .map_err(|_| PipelineError::Timeout {
                action,
                secs: self.schedule.action_timeout.as_secs(),
            })?
    }

    /// One schedule check at local time `now`. Never fails; problems are logged and retried later.
    ///
    /// Walks `[yesterday - recovery_days + 1, yesterday]` oldest first. Yesterday waits for
    /// TIME_EXPORT and TIME_POST; earlier days are past both. Actions run one at a time.
    #[instrument(skip_all, fields(now = %now))]
    pub async fn tick(&mut self, now: DateTime<FixedOffset>) -> TickReport {
        let yesterday = DayKey::yesterday_of(now);
        let span = self.schedule.recovery_days.saturating_sub(1);
        let oldest = yesterday.days_before(span);
        self.states.retain(|d, _| *d >= oldest);

        let time = now.time();
        let mut report = TickReport::default();
        for back in (0..=span).rev() {
            let day = yesterday.days_before(back);
            let catching_up = back > 0;
            let export_due = catching_up || time >= self.schedule.time_export;
            let post_due = catching_up || time >= self.schedule.time_post;

            let day_report = self.tick_day(day, export_due, post_due, catching_up).await;
            if day_report.export.is_some() || day_report.post.is_some() {
                report.days.push(day_report);
            }
        }
        report
    }

    async fn tick_day(
        &mut self,
        day: DayKey,
        export_due: bool,
        post_due: bool,
        catching_up: bool,
    ) -> DayReport {
        let mut report = DayReport {
            day,
            export: None,
            post: None,
        };

        if export_due && self.state(day) == DayState::Pending {
            report.export = Some(match self.export_day(day).await {
                Ok(artifact) => {
                    info!(day = %day, action = "export", catching_up, parts = artifact.parts.len(), messages = artifact.message_count, "Day exported");
                    ActionOutcome::Exported {
                        parts: artifact.parts.len(),
                    }
                }
                Err(e) => {
                    error!(day = %day, action = "export", error = %e, "Export failed, retrying next tick");
                    ActionOutcome::Failed(e.to_string())
                }
            });
        }

        if post_due && self.state(day) == DayState::Exported {
            report.post = Some(match self.post_day(day).await {
                Ok(PostResult::Posted { chunks }) => {
                    info!(day = %day, action = "post", catching_up, chunks, "Summary posted");
                    ActionOutcome::Posted { chunks }
                }
                Ok(PostResult::NotReady) => {
                    if catching_up {
                        debug!(day = %day, action = "post", "Summary still not ready");
                    } else {
                        info!(day = %day, action = "post", "Summary not ready, retrying next tick");
                    }
                    ActionOutcome::NotReady
                }
                Ok(PostResult::Invalid { reason }) => {
                    warn!(day = %day, action = "post", reason = %reason, "Summary invalid, retrying next tick");
                    ActionOutcome::Invalid(reason)
                }
                Err(e) => {
                    error!(day = %day, action = "post", error = %e, "Post failed, retrying next tick");
                    ActionOutcome::Failed(e.to_string())
                }
            });
        }

        report
    }

    /// Ticks every `tick_interval` until `shutdown` is cancelled. A tick in progress finishes
    /// before shutdown is observed, so no transition is recorded for an unfinished action.
    pub async fn run(
        mut self,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
        shutdown: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            tick_interval_secs = tick_interval.as_secs(),
            time_export = %self.schedule.time_export,
            time_post = %self.schedule.time_post,
            "Schedule loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Schedule loop received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    self.tick(clock.now()).await;
                }
            }
        }

        info!("Schedule loop stopped");
    }
}
