//! Domain types for Mastermind
//!
//! - `record`: record identity and collection naming
//! - `task`: Eisenhower-matrix tasks
//! - `journal`: journal entries
//! - `schedule`: daily schedule items
//! - `common`: shared traits and utilities

mod common;
mod journal;
mod record;
mod schedule;
mod task;

pub use common::{Timestamp, Validator};
pub use journal::JournalEntry;
pub use record::{
    check_snapshot, collections, extract_record_id, is_valid_collection_name, snapshot_ids, Record,
    RecordId, SnapshotError,
};
pub use schedule::ScheduleItem;
pub use task::{Quadrant, Task};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_collections() {
        assert_eq!(Task::COLLECTION, collections::TASKS);
        assert_eq!(JournalEntry::COLLECTION, collections::JOURNAL_ENTRIES);
        assert_eq!(ScheduleItem::COLLECTION, collections::SCHEDULE);
        assert!(is_valid_collection_name(Task::COLLECTION));
    }
}
