//! Shared fakes for pipeline integration tests: a recording bot, a fixed clock, scripted
//! exporter and poster, and an in-memory run record store.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use chronicle_core::{Bot, ChronicleError, Destination};
use chronicle_pipeline::{
    Clock, DayExporter, DayKey, DayPoster, ExportArtifact, PipelineError, PostResult, Schedule,
};
use storage::{RunRecord, RunRecordStore, StorageError};

pub fn msk() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).unwrap()
}

pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    msk().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> DayKey {
    DayKey::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Export at 00:05, post at 09:00, 1s action bound, only yesterday in the window.
pub fn schedule() -> Schedule {
    schedule_with_window(1)
}

pub fn schedule_with_window(recovery_days: u32) -> Schedule {
    Schedule {
        time_export: hm(0, 5),
        time_post: hm(9, 0),
        action_timeout: Duration::from_secs(1),
        recovery_days,
    }
}

/// Records every sent message; fails from the `fail_from`-th send (0-based) on.
#[derive(Clone, Default)]
pub struct MockBot {
    pub sent: Arc<Mutex<Vec<(Destination, String)>>>,
    fail_from: Option<usize>,
}

impl MockBot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_from(n: usize) -> Self {
        Self {
            sent: Arc::default(),
            fail_from: Some(n),
        }
    }

    pub fn sent(&self) -> Vec<(Destination, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, destination: &Destination, text: &str) -> chronicle_core::Result<()> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_from.is_some_and(|n| sent.len() >= n) {
            return Err(ChronicleError::Transport("mock transport down".to_string()));
        }
        sent.push((*destination, text.to_string()));
        Ok(())
    }
}

pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Exporter that counts calls and can fail or stall.
#[derive(Default)]
pub struct ScriptedExporter {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
    pub days: Mutex<Vec<DayKey>>,
}

impl ScriptedExporter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Days passed to `export`, in call order.
    pub fn days(&self) -> Vec<DayKey> {
        self.days.lock().unwrap().clone()
    }
}

#[async_trait]
impl DayExporter for ScriptedExporter {
    async fn export(&self, day: DayKey) -> chronicle_pipeline::Result<ExportArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.days.lock().unwrap().push(day);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only artifact root",
            )));
        }
        Ok(ExportArtifact {
            day,
            dir: PathBuf::from(day.dir_name()),
            parts: Vec::new(),
            message_count: 0,
        })
    }
}

/// Poster that counts calls and returns a settable result. Days listed in `not_ready` always
/// get `NotReady`, whatever `result` says.
pub struct ScriptedPoster {
    pub calls: AtomicUsize,
    pub result: Mutex<PostResult>,
    pub fail: AtomicBool,
    pub not_ready: Mutex<Vec<DayKey>>,
    pub days: Mutex<Vec<DayKey>>,
}

impl Default for ScriptedPoster {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            result: Mutex::new(PostResult::Posted { chunks: 1 }),
            fail: AtomicBool::new(false),
            not_ready: Mutex::new(Vec::new()),
            days: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedPoster {
    pub fn returning(result: PostResult) -> Self {
        Self {
            result: Mutex::new(result),
            ..Self::default()
        }
    }

    pub fn set_result(&self, result: PostResult) {
        *self.result.lock().unwrap() = result;
    }

    pub fn set_not_ready(&self, days: Vec<DayKey>) {
        *self.not_ready.lock().unwrap() = days;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Days passed to `post`, in call order.
    pub fn days(&self) -> Vec<DayKey> {
        self.days.lock().unwrap().clone()
    }
}

#[async_trait]
impl DayPoster for ScriptedPoster {
    async fn post(&self, day: DayKey) -> chronicle_pipeline::Result<PostResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.days.lock().unwrap().push(day);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PipelineError::Transport("mock transport down".to_string()));
        }
        if self.not_ready.lock().unwrap().contains(&day) {
            return Ok(PostResult::NotReady);
        }
        Ok(self.result.lock().unwrap().clone())
    }
}

/// Run records kept in a map, enforcing posted-implies-exported like the SQLite store.
#[derive(Default)]
pub struct MemoryRunRecords {
    pub records: Mutex<BTreeMap<NaiveDate, RunRecord>>,
}

impl MemoryRunRecords {
    pub fn snapshot(&self) -> Vec<RunRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl RunRecordStore for MemoryRunRecords {
    async fn get(&self, day: NaiveDate) -> Result<Option<RunRecord>, StorageError> {
        Ok(self.records.lock().unwrap().get(&day).cloned())
    }

    async fn load_since(&self, first_day: NaiveDate) -> Result<Vec<RunRecord>, StorageError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .range(first_day..)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn mark_exported(&self, day: NaiveDate) -> Result<(), StorageError> {
        let mut records = self.records.lock().unwrap();
        let record = records.entry(day).or_insert_with(|| RunRecord {
            day,
            exported: false,
            posted: false,
            exported_at: None,
            posted_at: None,
        });
        record.exported = true;
        record.exported_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_posted(&self, day: NaiveDate) -> Result<(), StorageError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&day) {
            Some(record) if record.exported => {
                record.posted = true;
                record.posted_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(StorageError::Invariant(format!("{} is not exported", day))),
        }
    }
}
