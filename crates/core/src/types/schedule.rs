//! Daily schedule model

use crate::types::{Record, RecordId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A block of time reserved on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: RecordId,
    pub name: String,
    /// Free-form duration label such as "2 hours"
    pub time: String,
    pub date: NaiveDate,
}

impl ScheduleItem {
    /// Creates a schedule item
    pub fn new(name: impl Into<String>, time: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            time: time.into(),
            date,
        }
    }
}

impl Record for ScheduleItem {
    const COLLECTION: &'static str = super::collections::SCHEDULE;

    fn id(&self) -> &RecordId {
        &self.id
    }
}
