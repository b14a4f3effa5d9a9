use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted todo. Id and creation time are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Apply the mutable fields. Id and `created_at` never change after creation.
    pub fn apply_changes(&mut self, title: impl Into<String>, completed: bool) {
        self.title = title.into();
        self.completed = completed;
    }
}

/// A todo that has not been persisted yet; id and creation time may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>, completed: bool) -> Self {
        Self { id: None, title: title.into(), completed, created_at: None }
    }

    /// Fill in a missing id (UUID v4) and creation time, producing the record
    /// written on first persistence. A blank id counts as missing.
    ///
    /// Timestamps are truncated to microseconds so both replicas store the same value.
    pub fn into_todo(self, now: DateTime<Utc>) -> Todo {
        let id = self.id.filter(|id| !id.trim().is_empty()).unwrap_or_else(new_id);
        let created_at = truncate_to_micros(self.created_at.unwrap_or(now));
        Todo { id, title: self.title, completed: self.completed, created_at }
    }
}

pub fn new_id() -> String { Uuid::new_v4().to_string() }

fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(ts.nanosecond() / 1_000 * 1_000).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn draft_without_id_gets_uuid_and_timestamp() {
        let now = Utc::now();
        let todo = TodoDraft::new("Buy milk", false).into_todo(now);
        assert!(Uuid::parse_str(&todo.id).is_ok());
        assert_eq!(todo.created_at.timestamp_micros(), now.timestamp_micros());
        assert_eq!(todo.title, "Buy milk");
        assert!(!todo.completed);
    }

    #[test]
    fn supplied_values_are_kept() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let draft = TodoDraft { id: Some("fixed".into()), title: "t".into(), completed: true, created_at: Some(at) };
        let todo = draft.into_todo(Utc::now());
        assert_eq!(todo.id, "fixed");
        assert_eq!(todo.created_at, at);
    }

    #[test]
    fn blank_id_is_replaced() {
        let draft = TodoDraft { id: Some("  ".into()), ..TodoDraft::new("t", false) };
        assert!(!draft.into_todo(Utc::now()).id.trim().is_empty());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = TodoDraft::new("t", false).into_todo(Utc::now());
        let b = TodoDraft::new("t", false).into_todo(Utc::now());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn timestamp_truncated_to_micros() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let todo = TodoDraft::new("t", false).into_todo(at);
        assert_eq!(todo.created_at.nanosecond(), 123_456_000);
    }

    #[test]
    fn apply_changes_keeps_identity() {
        let mut todo = TodoDraft::new("old", false).into_todo(Utc::now());
        let (id, created) = (todo.id.clone(), todo.created_at);
        todo.apply_changes("new", true);
        assert_eq!((todo.id.as_str(), todo.created_at), (id.as_str(), created));
        assert_eq!(todo.title, "new");
        assert!(todo.completed);
    }

    #[test]
    fn serializes_camel_case() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let todo = Todo { id: "1".into(), title: "t".into(), completed: false, created_at: at };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["createdAt"], "2024-05-01T12:00:00Z");
        assert!(json.get("created_at").is_none());
    }
}
