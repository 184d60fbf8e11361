//! Journal entry model

use crate::types::{Record, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-form journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: RecordId,
    pub text: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
}

impl JournalEntry {
    /// Creates an entry dated now
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            text: text.into(),
            mood: None,
            tags: Vec::new(),
            date: Utc::now(),
        }
    }

    /// Sets the mood
    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    /// Adds a tag unless already present
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

impl Record for JournalEntry {
    const COLLECTION: &'static str = super::collections::JOURNAL_ENTRIES;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tag_dedupes() {
        let mut entry = JournalEntry::new("Good day").with_mood("Happy");
        entry.add_tag("walk");
        entry.add_tag("walk");
        assert_eq!(entry.tags, vec!["walk"]);
        assert_eq!(entry.mood.as_deref(), Some("Happy"));
    }
}
