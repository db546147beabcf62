//! Per-day completion flags.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StorageError;

pub(crate) const DAY_FORMAT: &str = "%Y-%m-%d";

/// Completion flags of one local calendar day. `posted` implies `exported`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub day: NaiveDate,
    pub exported: bool,
    pub posted: bool,
    pub exported_at: Option<DateTime<Utc>>,
    pub posted_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct RunRecordRow {
    pub day: String,
    pub exported: bool,
    pub posted: bool,
    pub exported_at_ms: Option<i64>,
    pub posted_at_ms: Option<i64>,
}

impl TryFrom<RunRecordRow> for RunRecord {
    type Error = StorageError;

    fn try_from(row: RunRecordRow) -> Result<Self, Self::Error> {
        let day = NaiveDate::parse_from_str(&row.day, DAY_FORMAT).map_err(|_| {
            StorageError::Invariant(format!("run record has malformed day '{}'", row.day))
        })?;
        if row.posted && !row.exported {
            return Err(StorageError::Invariant(format!(
                "run record {} is posted but not exported",
                row.day
            )));
        }
        Ok(Self {
            day,
            exported: row.exported,
            posted: row.posted,
            exported_at: row.exported_at_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
            posted_at: row.posted_at_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }
}
