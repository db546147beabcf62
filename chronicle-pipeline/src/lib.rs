//! # chronicle-pipeline
//!
//! The daily batch: archive incoming messages, export yesterday's messages as size-bounded text
//! parts, post the externally written summary back to the chat, and drive both on a schedule.
//!
//! ## Modules
//!
//! - [`ingest`] – IngestFilter and ArchiveHandler for the handler chain
//! - [`exporter`] – DailyExporter writing `DD.MM.YYYY/messages_part<N>.txt`
//! - [`poster`] – SummaryPoster sending `summary.txt` in chunks
//! - [`driver`] – ScheduleDriver and its per-day state
//! - [`day_key`] – local calendar day
//! - [`chunk`] – text chunking for the transport limit

pub mod chunk;
pub mod clock;
pub mod day_key;
pub mod driver;
pub mod error;
pub mod exporter;
pub mod ingest;
pub mod poster;

pub use chunk::split_into_chunks;
pub use clock::{Clock, SystemClock};
pub use day_key::DayKey;
pub use driver::{ActionOutcome, DayReport, DayState, Schedule, ScheduleDriver, TickReport};
pub use error::{PipelineError, Result};
pub use exporter::{
    format_record, part_file_name, partition_records, DailyExporter, DayExporter, ExportArtifact,
    ExportPart,
};
pub use ingest::{ingest_chain, to_record, ArchiveHandler, IngestFilter, SkipReason};
pub use poster::{DayPoster, PostResult, SummaryPoster, SUMMARY_FILE_NAME};
