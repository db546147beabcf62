//! Summary posting: picks up `summary.txt` dropped next to a day's export and sends it to the
//! summary topic in chunks.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chronicle_core::{Bot, Destination};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::chunk::split_into_chunks;
use crate::day_key::DayKey;
use crate::error::Result;

pub const SUMMARY_FILE_NAME: &str = "summary.txt";

/// Outcome of a post attempt that reached a decision. Transport failures are errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostResult {
    /// Every chunk was accepted by the transport.
    Posted { chunks: usize },
    /// No summary yet; the external producer has not run.
    NotReady,
    /// A summary exists but cannot be posted (empty, unreadable, not UTF-8).
    Invalid { reason: String },
}

impl PostResult {
    pub fn posted(&self) -> bool {
        matches!(self, PostResult::Posted { .. })
    }
}

/// Anything that can post a day's summary. The schedule driver depends on this, not on [`SummaryPoster`].
#[async_trait]
pub trait DayPoster: Send + Sync {
    async fn post(&self, day: DayKey) -> Result<PostResult>;
}

pub struct SummaryPoster {
    bot: Arc<dyn Bot>,
    root: PathBuf,
    destination: Destination,
    max_summary_size: usize,
    header: Option<String>,
}

impl SummaryPoster {
    pub fn new(
        bot: Arc<dyn Bot>,
        root: impl Into<PathBuf>,
        destination: Destination,
        max_summary_size: usize,
    ) -> Self {
        Self {
            bot,
            root: root.into(),
            destination,
            max_summary_size,
            header: None,
        }
    }

    /// Line sent before the summary; `{date}` becomes `DD.MM`.
    pub fn with_header(mut self, header: Option<String>) -> Self {
        self.header = header.filter(|h| !h.trim().is_empty());
        self
    }

    pub fn summary_path(&self, day: DayKey) -> PathBuf {
        self.root.join(day.dir_name()).join(SUMMARY_FILE_NAME)
    }

    async fn read_summary(&self, day: DayKey) -> std::result::Result<String, PostResult> {
        let path = self.summary_path(day);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Summary not found");
                return Err(PostResult::NotReady);
            }
            Err(e) => {
                return Err(PostResult::Invalid {
                    reason: format!("cannot read {}: {}", path.display(), e),
                })
            }
        };

        let text = String::from_utf8(bytes).map_err(|_| PostResult::Invalid {
            reason: format!("{} is not valid UTF-8", path.display()),
        })?;
        if text.trim().is_empty() {
            return Err(PostResult::Invalid {
                reason: format!("{} is empty", path.display()),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl DayPoster for SummaryPoster {
    #[instrument(skip_all, fields(day = %day))]
    async fn post(&self, day: DayKey) -> Result<PostResult> {
        let summary = match self.read_summary(day).await {
            Ok(summary) => summary,
            Err(outcome) => return Ok(outcome),
        };

        let text = match &self.header {
            Some(header) => format!("{}\n{}", header.replace("{date}", &day.short_label()), summary),
            None => summary,
        };

        let chunks = split_into_chunks(&text, self.max_summary_size);
        for (i, chunk) in chunks.iter().enumerate() {
            self.bot.send_message(&self.destination, chunk).await?;
            debug!(chunk = i + 1, of = chunks.len(), bytes = chunk.len(), "Summary chunk sent");
        }

        info!(chunks = chunks.len(), "Summary posted");
        Ok(PostResult::Posted {
            chunks: chunks.len(),
        })
    }
}
