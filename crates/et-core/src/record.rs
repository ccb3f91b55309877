//! Outbound activity records.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::action::ActionType;

/// One unit of activity as the backend stores it.
///
/// Field names on the wire are camelCase and fixed by the backend contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub username: String,
    pub file_name: String,
    pub file_path: String,
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub timestamp: DateTime<Utc>,
    pub action_type: ActionType,
    pub typed_lines: u64,
    pub pasted_lines: u64,
    pub total_lines: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_snippet: Option<String>,
    pub editor_version: String,
}

/// Who is producing records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordContext {
    pub username: String,
    pub editor_version: String,
    /// Attach the latest content snippet to each record.
    pub include_snippets: bool,
}

/// Counters for one record, before stamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub file_name: String,
    pub file_path: String,
    pub typed_lines: u64,
    pub pasted_lines: u64,
    pub deleted_lines: u64,
    pub snippet: Option<String>,
}

impl ActivityRecord {
    /// Builds a record at `now`, formatting date and time in the local zone.
    pub fn build(draft: &RecordDraft, context: &RecordContext, now: DateTime<Utc>) -> Self {
        let local = now.with_timezone(&Local);
        Self::build_at(draft, context, now, &local)
    }

    /// Builds a record with an explicit wall clock, for deterministic output.
    pub fn build_at<Tz>(
        draft: &RecordDraft,
        context: &RecordContext,
        now: DateTime<Utc>,
        wall_clock: &DateTime<Tz>,
    ) -> Self
    where
        Tz: chrono::TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            username: context.username.clone(),
            file_name: draft.file_name.clone(),
            file_path: draft.file_path.clone(),
            date: wall_clock.format("%Y-%m-%d").to_string(),
            time: wall_clock.format("%H:%M:%S").to_string(),
            timestamp: now,
            action_type: ActionType::majority(
                draft.typed_lines,
                draft.pasted_lines,
                draft.deleted_lines,
            ),
            typed_lines: draft.typed_lines,
            pasted_lines: draft.pasted_lines,
            total_lines: draft.typed_lines.saturating_add(draft.pasted_lines),
            content_snippet: if context.include_snippets {
                draft.snippet.clone()
            } else {
                None
            },
            editor_version: context.editor_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    fn draft() -> RecordDraft {
        RecordDraft {
            file_name: "main.rs".to_string(),
            file_path: "/repo/src/main.rs".to_string(),
            typed_lines: 12,
            pasted_lines: 30,
            deleted_lines: 2,
            snippet: Some("fn main() { run(); }".to_string()),
        }
    }

    fn context(include_snippets: bool) -> RecordContext {
        RecordContext {
            username: "ada".to_string(),
            editor_version: "1.96.0".to_string(),
            include_snippets,
        }
    }

    fn fixed_now() -> (DateTime<Utc>, DateTime<FixedOffset>) {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 23, 5, 7).unwrap();
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        (now, now.with_timezone(&offset))
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let (now, wall) = fixed_now();
        let record = ActivityRecord::build_at(&draft(), &context(true), now, &wall);
        let json = serde_json::to_string_pretty(&record).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "username": "ada",
          "fileName": "main.rs",
          "filePath": "/repo/src/main.rs",
          "date": "2025-03-10",
          "time": "01:05:07",
          "timestamp": "2025-03-09T23:05:07Z",
          "actionType": "paste",
          "typedLines": 12,
          "pastedLines": 30,
          "totalLines": 42,
          "contentSnippet": "fn main() { run(); }",
          "editorVersion": "1.96.0"
        }
        "#);
    }

    #[test]
    fn snippet_omitted_when_tracking_disabled() {
        let (now, wall) = fixed_now();
        let record = ActivityRecord::build_at(&draft(), &context(false), now, &wall);
        assert!(record.content_snippet.is_none());
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("contentSnippet").is_none());
    }

    #[test]
    fn date_and_time_match_wire_shapes() {
        let record = ActivityRecord::build(&draft(), &context(true), Utc::now());
        let date = record.date.as_bytes();
        assert_eq!(date.len(), 10);
        assert!(date[4] == b'-' && date[7] == b'-');
        let time = record.time.as_bytes();
        assert_eq!(time.len(), 8);
        assert!(time[2] == b':' && time[5] == b':');
        assert!(
            record
                .date
                .chars()
                .chain(record.time.chars())
                .all(|c| c.is_ascii_digit() || c == '-' || c == ':')
        );
    }

    #[test]
    fn deletion_heavy_draft_is_a_delete_record() {
        let (now, wall) = fixed_now();
        let mut d = draft();
        d.typed_lines = 1;
        d.pasted_lines = 0;
        d.deleted_lines = 20;
        let record = ActivityRecord::build_at(&d, &context(true), now, &wall);
        assert_eq!(record.action_type, ActionType::Delete);
        assert_eq!(record.total_lines, 1);
    }

    #[test]
    fn record_round_trips_through_json() {
        let (now, wall) = fixed_now();
        let record = ActivityRecord::build_at(&draft(), &context(true), now, &wall);
        let parsed: ActivityRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(parsed, record);
    }
}
