//! Eisenhower-matrix task model

use crate::types::{Record, RecordId, Validator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Eisenhower matrix quadrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quadrant {
    /// Do first
    ImportantUrgent,
    /// Schedule
    ImportantNotUrgent,
    /// Delegate
    NotImportantUrgent,
    /// Drop
    NotImportantNotUrgent,
}

impl Quadrant {
    /// All quadrants in matrix order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::ImportantUrgent,
        Quadrant::ImportantNotUrgent,
        Quadrant::NotImportantUrgent,
        Quadrant::NotImportantNotUrgent,
    ];

    /// Returns the quadrant for a 1-based matrix position
    pub fn from_number(n: u16) -> Option<Self> {
        match n {
            1 => Some(Quadrant::ImportantUrgent),
            2 => Some(Quadrant::ImportantNotUrgent),
            3 => Some(Quadrant::NotImportantUrgent),
            4 => Some(Quadrant::NotImportantNotUrgent),
            _ => None,
        }
    }

    /// Returns the 1-based matrix position
    pub fn number(&self) -> u16 {
        match self {
            Quadrant::ImportantUrgent => 1,
            Quadrant::ImportantNotUrgent => 2,
            Quadrant::NotImportantUrgent => 3,
            Quadrant::NotImportantNotUrgent => 4,
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quadrant::ImportantUrgent => "Important/Urgent",
            Quadrant::ImportantNotUrgent => "Important/Not Urgent",
            Quadrant::NotImportantUrgent => "Not Important/Urgent",
            Quadrant::NotImportantNotUrgent => "Not Important/Not Urgent",
        };
        f.write_str(label)
    }
}

/// A task on the planning board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub quadrant: Option<Quadrant>,
    #[serde(default, alias = "dueDate")]
    pub due_by: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates an unassigned task with a fresh identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            quadrant: None,
            due_by: None,
            estimated_time: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Places the task in a quadrant
    pub fn with_quadrant(mut self, quadrant: Quadrant) -> Self {
        self.quadrant = Some(quadrant);
        self
    }

    /// Sets the due date
    pub fn with_due_by(mut self, due_by: DateTime<Utc>) -> Self {
        self.due_by = Some(due_by);
        self
    }

    /// Adds tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Returns true if the task has not been placed in the matrix yet
    pub fn is_unassigned(&self) -> bool {
        self.quadrant.is_none()
    }
}

impl Record for Task {
    const COLLECTION: &'static str = super::collections::TASKS;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Validator for Task {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Task name cannot be empty".to_string());
        }

        if self.tags.iter().any(|t| t.trim().is_empty()) {
            errors.push("Tags cannot be blank".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
