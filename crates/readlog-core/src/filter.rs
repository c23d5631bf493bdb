use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use deunicode::deunicode;
use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::datetime::format_form_date;
use crate::record::{
  Record,
  RecordExt
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
  Date,
  Time,
  Title,
  User
}

impl SortKey {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Date => "date",
      | Self::Time => "time",
      | Self::Title => "title",
      | Self::User => "user"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Date => "Date",
      | Self::Time => "Time spent",
      | Self::Title => "Title",
      | Self::User => "User"
    }
  }

  fn parse(raw: &str) -> Option<Self> {
    match raw {
      | "date" => Some(Self::Date),
      | "time" | "duration" => {
        Some(Self::Time)
      }
      | "title" => Some(Self::Title),
      | "user" => Some(Self::User),
      | _ => None
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  Desc
}

/// A sort key plus direction, written
/// `<key>-<asc|desc>` on the wire and in
/// select options.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub struct SortOrder {
  pub key:       SortKey,
  pub direction: SortDirection
}

impl SortOrder {
  pub const DEFAULT: Self = Self {
    key:       SortKey::Date,
    direction: SortDirection::Desc
  };

  pub fn new(
    key: SortKey,
    direction: SortDirection
  ) -> Self {
    Self {
      key,
      direction
    }
  }

  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    let (key, direction) =
      raw.trim().split_once('-')?;
    let key = SortKey::parse(key)?;
    let direction = match direction {
      | "asc" => SortDirection::Asc,
      | "desc" => SortDirection::Desc,
      | _ => return None
    };
    Some(Self::new(key, direction))
  }

  pub fn label(self) -> String {
    let arrow = match self.direction {
      | SortDirection::Asc => "ascending",
      | SortDirection::Desc => {
        "descending"
      }
    };
    format!(
      "{} ({arrow})",
      self.key.label()
    )
  }

  pub fn compare(
    self,
    a: &Record,
    b: &Record
  ) -> Ordering {
    let ordering = match self.key {
      | SortKey::Date => a.day().cmp(&b.day()),
      | SortKey::Time => {
        a.time_spent.cmp(&b.time_spent)
      }
      | SortKey::Title => {
        compare_text(&a.title, &b.title)
      }
      | SortKey::User => compare_text(
        a.username.as_deref().unwrap_or(""),
        b.username.as_deref().unwrap_or("")
      )
    };

    match self.direction {
      | SortDirection::Asc => ordering,
      | SortDirection::Desc => {
        ordering.reverse()
      }
    }
  }
}

impl fmt::Display for SortOrder {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    let direction = match self.direction
    {
      | SortDirection::Asc => "asc",
      | SortDirection::Desc => "desc"
    };
    write!(
      f,
      "{}-{direction}",
      self.key.as_key()
    )
  }
}

/// Locale-aware text comparison: letters
/// are compared with accents and case
/// folded first, then accents, then case
/// (lowercase before uppercase).
pub fn compare_text(
  a: &str,
  b: &str
) -> Ordering {
  let a_plain = deunicode(a);
  let b_plain = deunicode(b);

  a_plain
    .to_lowercase()
    .cmp(&b_plain.to_lowercase())
    .then_with(|| {
      a.to_lowercase()
        .cmp(&b.to_lowercase())
    })
    .then_with(|| {
      a.chars()
        .map(char::is_uppercase)
        .cmp(
          b.chars()
            .map(char::is_uppercase)
        )
    })
    .then_with(|| a.cmp(b))
}

/// Stable in-place sort; records with
/// equal keys keep their relative order
/// in both directions.
pub fn sort_records(
  records: &mut [Record],
  order: SortOrder
) {
  records.sort_by(|a, b| {
    order.compare(a, b)
  });
}

#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct FilterCriteria {
  pub query:      String,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
  pub min_time:   Option<u32>,
  pub max_time:   Option<u32>,
  pub sort:       Option<SortOrder>
}

impl FilterCriteria {
  pub fn with_query(
    query: impl Into<String>
  ) -> Self {
    Self {
      query: query.into(),
      ..Self::default()
    }
  }

  pub fn has_filters(&self) -> bool {
    !self.query.trim().is_empty()
      || self.start_date.is_some()
      || self.end_date.is_some()
      || self.min_time.is_some()
      || self.max_time.is_some()
  }

  pub fn is_empty(&self) -> bool {
    !self.has_filters()
      && self.sort.is_none()
  }

  pub fn matches(
    &self,
    record: &Record
  ) -> bool {
    let query =
      self.query.trim().to_lowercase();
    if !record.matches_query(&query) {
      return false;
    }

    if self.start_date.is_some()
      || self.end_date.is_some()
    {
      let Some(day) = record.day() else {
        return false;
      };
      if self
        .start_date
        .is_some_and(|start| day < start)
      {
        return false;
      }
      if self
        .end_date
        .is_some_and(|end| day > end)
      {
        return false;
      }
    }

    let min = self.min_time.unwrap_or(0);
    let max =
      self.max_time.unwrap_or(u32::MAX);
    record.time_spent >= min
      && record.time_spent <= max
  }

  /// Local equivalent of the filtered
  /// list endpoint.
  #[tracing::instrument(skip_all, fields(total = records.len()))]
  pub fn apply(
    &self,
    records: &[Record]
  ) -> Vec<Record> {
    let mut out: Vec<Record> = records
      .iter()
      .filter(|record| {
        self.matches(record)
      })
      .cloned()
      .collect();

    if let Some(order) = self.sort {
      sort_records(&mut out, order);
    }

    trace!(
      kept = out.len(),
      "applied local filter"
    );
    out
  }

  /// Query parameters for the filtered
  /// list endpoint; empty values are
  /// omitted.
  pub fn query_params(
    &self
  ) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let query = self.query.trim();
    if !query.is_empty() {
      params.push((
        "query".to_string(),
        query.to_string()
      ));
    }
    if let Some(start) = self.start_date {
      params.push((
        "startDate".to_string(),
        format_form_date(start)
      ));
    }
    if let Some(end) = self.end_date {
      params.push((
        "endDate".to_string(),
        format_form_date(end)
      ));
    }
    if let Some(min) = self.min_time {
      params.push((
        "minTime".to_string(),
        min.to_string()
      ));
    }
    if let Some(max) = self.max_time {
      params.push((
        "maxTime".to_string(),
        max.to_string()
      ));
    }
    if let Some(sort) = self.sort {
      params.push((
        "sort".to_string(),
        sort.to_string()
      ));
    }
    params
  }
}
