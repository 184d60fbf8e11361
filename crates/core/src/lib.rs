//! Shared error and domain types for the Mastermind planner.

pub mod error;
pub mod types;

pub use error::{AppError, ErrorSeverity, Result};
pub use types::{
    check_snapshot, collections, extract_record_id, is_valid_collection_name, snapshot_ids,
    JournalEntry, Quadrant, Record, RecordId, ScheduleItem, SnapshotError, Task, Timestamp,
    Validator,
};
