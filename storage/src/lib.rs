//! Storage crate: message archive and run record persistence.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – MessageRecord, RunRecord
//! - [`repository`] – MessageStore and RunRecordStore traits
//! - [`message_repo`] – MessageRepository (SQLite)
//! - [`run_record_repo`] – RunRecordRepository (SQLite)
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod message_repo;
mod models;
mod repository;
mod run_record_repo;
mod sqlite_pool;


pub use error::StorageError;
pub use message_repo::MessageRepository;
pub use models::{MessageRecord, RunRecord};
pub use repository::{MessageStore, RunRecordStore};
pub use run_record_repo::RunRecordRepository;
pub use sqlite_pool::SqlitePoolManager;
