mod message_record;
mod run_record;

pub use message_record::MessageRecord;
pub(crate) use message_record::MessageRow;
pub use run_record::RunRecord;
pub(crate) use run_record::{RunRecordRow, DAY_FORMAT};
