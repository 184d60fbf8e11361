//! Record identity and collection naming rules

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Well-known collection names used by the planner
pub mod collections {
    /// Eisenhower-matrix tasks
    pub const TASKS: &str = "tasks";
    /// Journal entries
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
    /// Daily schedule
    pub const SCHEDULE: &str = "schedule";

    /// Names that collide with fixed server routes
    pub const RESERVED: &[&str] = &["health"];

    /// Maximum length of a collection name
    pub const MAX_NAME_LEN: usize = 64;
}

/// Returns true if `name` can be used as a collection name
///
/// Collection names double as URL path segments, so they are restricted to
/// ASCII alphanumerics, `_` and `-`.
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= collections::MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        && !collections::RESERVED.contains(&name)
}

/// Caller-assigned identifier of a record
///
/// Identifiers arrive from clients either as strings or as integers (millisecond
/// timestamps); both normalize to the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Creates an identifier from a string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordIdVisitor;

        impl Visitor<'_> for RecordIdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-empty string or an integer identifier")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                if v.is_empty() {
                    return Err(E::invalid_value(de::Unexpected::Str(v), &self));
                }
                Ok(RecordId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }
        }

        deserializer.deserialize_any(RecordIdVisitor)
    }
}

/// An application entity stored inside a collection
pub trait Record {
    /// Name of the collection this record type lives in
    const COLLECTION: &'static str;

    /// Returns the record's identifier
    fn id(&self) -> &RecordId;
}

/// Field names accepted as the record identifier, in lookup order
const ID_FIELDS: &[&str] = &["id", "Id", "_id"];

/// Extracts the identifier of a JSON record
///
/// Returns `None` when the value is not an object, has no identifier field, or the
/// identifier is neither a non-empty string nor an integer.
pub fn extract_record_id(record: &serde_json::Value) -> Option<RecordId> {
    let object = record.as_object()?;
    let raw = ID_FIELDS.iter().find_map(|field| object.get(*field))?;

    match raw {
        serde_json::Value::String(s) if !s.is_empty() => Some(RecordId(s.clone())),
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Some(RecordId(n.to_string())),
        _ => None,
    }
}

/// Why a collection snapshot can never be reconciled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot must be a JSON array of records")]
    NotAnArray,

    #[error("record {index} has no usable id")]
    MissingId { index: usize },

    #[error("id {id} appears more than once")]
    DuplicateId { id: RecordId },
}

/// Returns the identifiers of a snapshot's records, in order
///
/// Every record needs its own identifier; a missing or repeated id fails the
/// whole snapshot.
pub fn snapshot_ids(records: &[serde_json::Value]) -> Result<Vec<RecordId>, SnapshotError> {
    let mut seen = HashSet::with_capacity(records.len());

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let id = extract_record_id(record).ok_or(SnapshotError::MissingId { index })?;
            if !seen.insert(id.clone()) {
                return Err(SnapshotError::DuplicateId { id });
            }
            Ok(id)
        })
        .collect()
}

/// Checks that a whole collection value is a reconcilable snapshot
pub fn check_snapshot(value: &serde_json::Value) -> Result<Vec<RecordId>, SnapshotError> {
    let records = value.as_array().ok_or(SnapshotError::NotAnArray)?;
    snapshot_ids(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_unique() {
        assert_ne!(RecordId::new(), RecordId::new());
    }

    #[test]
    fn test_record_id_accepts_numbers() {
        let id: RecordId = serde_json::from_value(json!(1718000000000i64)).unwrap();
        assert_eq!(id.as_str(), "1718000000000");

        let id: RecordId = serde_json::from_value(json!("k3j9x2a")).unwrap();
        assert_eq!(id.as_str(), "k3j9x2a");
    }

    #[test]
    fn test_record_id_rejects_empty_and_floats() {
        assert!(serde_json::from_value::<RecordId>(json!("")).is_err());
        assert!(serde_json::from_value::<RecordId>(json!(1.5)).is_err());
    }

    #[test]
    fn test_extract_record_id() {
        assert_eq!(
            extract_record_id(&json!({"id": 7, "name": "x"})),
            Some(RecordId::from_string("7"))
        );
        assert_eq!(
            extract_record_id(&json!({"Id": "abc"})),
            Some(RecordId::from_string("abc"))
        );
        assert_eq!(
            extract_record_id(&json!({"_id": "m1"})),
            Some(RecordId::from_string("m1"))
        );
        assert_eq!(extract_record_id(&json!({"name": "no id"})), None);
        assert_eq!(extract_record_id(&json!({"id": null})), None);
        assert_eq!(extract_record_id(&json!({"id": ""})), None);
        assert_eq!(extract_record_id(&json!([1, 2])), None);
    }

    #[test]
    fn test_snapshot_checks() {
        let ids = check_snapshot(&json!([{"id": 1}, {"Id": "b"}])).unwrap();
        assert_eq!(ids, vec![RecordId::from_string("1"), RecordId::from_string("b")]);
        assert!(check_snapshot(&json!([])).unwrap().is_empty());

        assert_eq!(check_snapshot(&json!({"id": 1})), Err(SnapshotError::NotAnArray));
        assert_eq!(
            check_snapshot(&json!([{"id": 1}, {"name": "x"}])),
            Err(SnapshotError::MissingId { index: 1 })
        );
        assert_eq!(
            check_snapshot(&json!([{"id": 7}, {"id": "7"}])),
            Err(SnapshotError::DuplicateId {
                id: RecordId::from_string("7")
            })
        );
    }

    #[test]
    fn test_collection_names() {
        assert!(is_valid_collection_name(collections::TASKS));
        assert!(is_valid_collection_name(collections::JOURNAL_ENTRIES));
        assert!(is_valid_collection_name("my-list_2"));
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("health"));
        assert!(!is_valid_collection_name("tasks/1"));
        assert!(!is_valid_collection_name("with space"));
        assert!(!is_valid_collection_name(&"x".repeat(65)));
    }
}
