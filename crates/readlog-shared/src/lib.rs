use std::collections::BTreeMap;

use chrono::{
  NaiveDate,
  NaiveDateTime
};
use serde::{
  Deserialize,
  Serialize
};

pub type RecordId = i64;

/// A reading-log or violation-log
/// entry as returned by the collection
/// and filter endpoints.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct RecordDto {
  pub id:           RecordId,
  #[serde(default)]
  pub title:        String,
  #[serde(default)]
  pub author:       String,
  #[serde(default)]
  pub date:         Option<NaiveDate>,
  #[serde(default)]
  pub created_at:   Option<NaiveDateTime>,
  #[serde(default)]
  pub time_spent:   u32,
  #[serde(default)]
  pub current_page: Option<u32>,
  #[serde(default)]
  pub total_pages:  Option<u32>,
  #[serde(default)]
  pub notes:        Option<String>,
  #[serde(default, alias = "userName")]
  pub username:     Option<String>,
  #[serde(default)]
  pub reason:       Option<String>
}

/// Body of a create or update request.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
  pub title:        String,
  pub author:       String,
  pub date:         NaiveDate,
  pub time_spent:   u32,
  pub current_page: Option<u32>,
  pub total_pages:  Option<u32>,
  #[serde(default)]
  pub notes:        String
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct CreatedDto {
  pub id:      Option<RecordId>,
  #[serde(default)]
  pub message: Option<String>
}

/// Error body returned by every
/// endpoint on a non-2xx status.
#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ErrorBody {
  #[serde(default)]
  pub error:   Option<String>,
  #[serde(default)]
  pub message: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryDto {
  pub id:           RecordId,
  #[serde(default)]
  pub title:        String,
  #[serde(default)]
  pub author:       String,
  pub date:         Option<NaiveDate>,
  #[serde(default)]
  pub time_spent:   Option<u32>,
  #[serde(default)]
  pub current_page: Option<u32>,
  #[serde(default)]
  pub total_pages:  Option<u32>,
  #[serde(default)]
  pub notes:        Option<String>,
  #[serde(default, alias = "current")]
  pub is_current:   bool
}

#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsDto {
  #[serde(default)]
  pub dates:              Vec<String>,
  #[serde(default)]
  pub reading_times:      Vec<u64>,
  #[serde(default)]
  pub book_count:         u64,
  #[serde(default)]
  pub total_reading_time: u64,
  #[serde(default)]
  pub avg_daily_time:     f64
}

#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct BookProgressDto {
  #[serde(default)]
  pub book_progress: BTreeMap<String, f64>
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn violation_payload_keeps_both_timestamps()
   {
    let raw = r#"{
      "id": 7,
      "username": "ada",
      "title": "Dune",
      "author": "Herbert",
      "date": "2024-01-01",
      "timeSpent": 45,
      "currentPage": 50,
      "totalPages": 200,
      "reason": "spam",
      "notes": null,
      "createdAt": "2024-01-03T10:15:30.123",
      "deletedAt": "2024-02-01T00:00:00"
    }"#;

    let record: RecordDto =
      serde_json::from_str(raw)
        .expect("decode violation log");

    assert_eq!(
      record.date,
      NaiveDate::from_ymd_opt(2024, 1, 1)
    );
    assert!(record.created_at.is_some());
    assert_eq!(
      record.username.as_deref(),
      Some("ada")
    );
    assert_eq!(record.total_pages, Some(200));
  }

  #[test]
  fn draft_serializes_missing_pages_as_null()
   {
    let draft = RecordDraft {
      title:        "Dune".to_string(),
      author:       "Herbert".to_string(),
      date:         NaiveDate::from_ymd_opt(
        2024, 1, 1
      )
      .expect("valid date"),
      time_spent:   45,
      current_page: None,
      total_pages:  None,
      notes:        String::new()
    };

    let value = serde_json::to_value(&draft)
      .expect("encode draft");
    assert_eq!(value["timeSpent"], 45);
    assert!(value["currentPage"].is_null());
    assert_eq!(value["date"], "2024-01-01");
  }

  #[test]
  fn history_entry_accepts_lombok_boolean_name()
   {
    let raw = r#"{"id": 3, "title": "Dune", "author": "Herbert", "date": "2024-01-02", "current": true}"#;
    let entry: HistoryEntryDto =
      serde_json::from_str(raw)
        .expect("decode history entry");
    assert!(entry.is_current);
  }
}
