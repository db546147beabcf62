//! Daily export: one day's messages written as size-bounded text parts.
//!
//! Layout under the artifact root:
//!
//! ```text
//! <root>/DD.MM.YYYY/messages_part1.txt
//! <root>/DD.MM.YYYY/messages_part2.txt
//! <root>/DD.MM.YYYY/summary.txt          (written by the external summarizer)
//! ```
//!
//! Parts are first written to `<root>/.DD.MM.YYYY.staging`. Once every part is on disk the
//! previous parts are moved to `<root>/.DD.MM.YYYY.previous` and the staged ones are moved in.
//! A failed swap puts the previous parts back; a swap cut short by a crash is undone at the start
//! of the next export of that day. The swap runs on the blocking pool and is not cancelled when
//! the export future is dropped.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::FixedOffset;
use storage::{MessageRecord, MessageStore};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::day_key::DayKey;
use crate::error::Result;

const PART_PREFIX: &str = "messages_part";
const PART_SUFFIX: &str = ".txt";

/// One written part file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPart {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Result of exporting a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub day: DayKey,
    pub dir: PathBuf,
    pub parts: Vec<ExportPart>,
    pub message_count: usize,
}

/// Anything that can export a day. The schedule driver depends on this, not on [`DailyExporter`].
#[async_trait]
pub trait DayExporter: Send + Sync {
    async fn export(&self, day: DayKey) -> Result<ExportArtifact>;
}

/// `messages_part<N>.txt`, N from 1.
pub fn part_file_name(index: usize) -> String {
    format!("{}{}{}", PART_PREFIX, index, PART_SUFFIX)
}

fn is_part_file_name(name: &str) -> bool {
    name.strip_prefix(PART_PREFIX)
        .and_then(|rest| rest.strip_suffix(PART_SUFFIX))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Serializes one message as `[HH:MM] author: body\n` in local time.
/// Line breaks inside the body are kept with continuation lines indented by two spaces.
pub fn format_record(message: &MessageRecord, offset: &FixedOffset) -> String {
    let local = message.sent_at.with_timezone(offset);
    let body = message
        .body
        .trim_end()
        .replace("\r\n", "\n")
        .replace('\n', "\n  ");
    format!("[{}] {}: {}\n", local.format("%H:%M"), message.author, body)
}

/// Packs records into parts of at most `max_bytes`, preserving order. A record is never split;
/// one larger than the limit gets a part of its own. Always returns at least one part.
pub fn partition_records(records: &[String], max_bytes: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for record in records {
        if !current.is_empty() && current.len() + record.len() > max_bytes {
            parts.push(std::mem::take(&mut current));
        }
        current.push_str(record);
    }

    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}

/// Exports days from a [`MessageStore`] into the artifact root.
pub struct DailyExporter {
    store: Arc<dyn MessageStore>,
    root: PathBuf,
    max_file_size: usize,
    offset: FixedOffset,
    /// Held from staging until the swap finishes, including a swap outliving a dropped export.
    writing: Arc<Mutex<()>>,
}

impl DailyExporter {
    pub fn new(
        store: Arc<dyn MessageStore>,
        root: impl Into<PathBuf>,
        max_file_size: usize,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            root: root.into(),
            max_file_size,
            offset,
            writing: Arc::new(Mutex::new(())),
        }
    }

    pub fn day_dir(&self, day: DayKey) -> PathBuf {
        self.root.join(day.dir_name())
    }

    fn staging_dir(&self, day: DayKey) -> PathBuf {
        self.root.join(format!(".{}.staging", day.dir_name()))
    }

    async fn write_parts(&self, day: DayKey, parts: &[String]) -> Result<Vec<ExportPart>> {
        let guard = self.writing.clone().lock_owned().await;
        let staging = self.staging_dir(day);
        let day_dir = self.day_dir(day);

        // Leftovers from an interrupted run.
        remove_dir_if_exists(&staging).await?;
        fs::create_dir_all(&staging).await?;

        let mut names = Vec::with_capacity(parts.len());
        for (i, text) in parts.iter().enumerate() {
            let name = part_file_name(i + 1);
            let mut file = fs::File::create(staging.join(&name)).await?;
            file.write_all(text.as_bytes()).await?;
            file.sync_all().await?;
            names.push(name);
        }

        let swap = PartSwap {
            staging,
            day_dir: day_dir.clone(),
            backup: self.root.join(format!(".{}.previous", day.dir_name())),
            discard: self.root.join(format!(".{}.discard", day.dir_name())),
            names: names.clone(),
        };
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            swap.run()
        })
        .await
        .map_err(io::Error::other)??;

        Ok(names
            .iter()
            .zip(parts)
            .map(|(name, text)| ExportPart {
                path: day_dir.join(name),
                bytes: text.len(),
            })
            .collect())
    }
}

/// Replaces the parts of one day directory with staged ones. Other files in the directory
/// (summary.txt) are never touched.
#[derive(Debug)]
struct PartSwap {
    staging: PathBuf,
    day_dir: PathBuf,
    /// Previous parts while the swap is in progress.
    backup: PathBuf,
    /// The backup renamed here commits the swap.
    discard: PathBuf,
    names: Vec<String>,
}

impl PartSwap {
    /// Either every staged part ends up installed or the previous parts are back in place.
    fn run(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.day_dir)?;
        if restore_backup(&self.backup, &self.day_dir)? {
            warn!(dir = %self.day_dir.display(), "Restored parts of an interrupted export");
        }
        remove_dir_all_if_exists(&self.discard)?;
        std::fs::create_dir(&self.backup)?;

        if let Err(e) = self.swap().and_then(|()| std::fs::rename(&self.backup, &self.discard)) {
            if let Err(rollback) = restore_backup(&self.backup, &self.day_dir) {
                error!(
                    error = %rollback,
                    backup = %self.backup.display(),
                    "Rollback failed; previous parts stay in the backup directory"
                );
            }
            return Err(e);
        }

        if let Err(e) = remove_dir_all_if_exists(&self.discard) {
            warn!(error = %e, dir = %self.discard.display(), "Failed to remove replaced parts");
        }
        std::fs::remove_dir(&self.staging)
    }

    fn swap(&self) -> io::Result<()> {
        for name in part_names_in(&self.day_dir)? {
            std::fs::rename(self.day_dir.join(&name), self.backup.join(&name))?;
        }
        for name in &self.names {
            std::fs::rename(self.staging.join(name), self.day_dir.join(name))?;
        }
        Ok(())
    }
}

/// Moves the parts saved in `backup` back into `day_dir`, dropping the parts found there.
/// Returns false when there is no backup.
fn restore_backup(backup: &Path, day_dir: &Path) -> io::Result<bool> {
    let saved = match part_names_in(backup) {
        Ok(saved) => saved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    for name in part_names_in(day_dir)? {
        std::fs::remove_file(day_dir.join(name))?;
    }
    for name in saved {
        std::fs::rename(backup.join(&name), day_dir.join(&name))?;
    }
    std::fs::remove_dir(backup)?;
    Ok(true)
}

/// `messages_part*.txt` names in `dir`.
fn part_names_in(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        if let Ok(name) = entry?.file_name().into_string() {
            if is_part_file_name(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

fn remove_dir_all_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[async_trait]
impl DayExporter for DailyExporter {
    #[instrument(skip_all, fields(day = %day))]
    async fn export(&self, day: DayKey) -> Result<ExportArtifact> {
        let (start, end) = day.bounds(&self.offset);
        let messages = self.store.query_range(start, end).await?;

        let records: Vec<String> = messages
            .iter()
            .map(|m| format_record(m, &self.offset))
            .collect();
        let parts = partition_records(&records, self.max_file_size);

        let oversized = parts.iter().filter(|p| p.len() > self.max_file_size).count();
        if oversized > 0 {
            warn!(oversized, max_file_size = self.max_file_size, "Single messages exceed the part size limit");
        }

        let written = match self.write_parts(day, &parts).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = remove_dir_if_exists(&self.staging_dir(day)).await {
                    debug!(error = %cleanup, "Failed to clean staging directory");
                }
                return Err(e);
            }
        };

        info!(
            messages = messages.len(),
            parts = written.len(),
            dir = %self.day_dir(day).display(),
            "Exported messages"
        );

        Ok(ExportArtifact {
            day,
            dir: self.day_dir(day),
            parts: written,
            message_count: messages.len(),
        })
    }
}

async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
