use chrono::NaiveDate;
use readlog_shared::{
  BookProgressDto,
  StatisticsDto
};
use thiserror::Error;

use crate::datetime::{
  format_form_date,
  one_month_before
};
use crate::http::ApiRequest;

const BY_PERIOD_PATH: &str =
  "/api/reading-statistics/by-period";
const BY_RANGE_PATH: &str =
  "/api/reading-statistics/by-date-range";
const BOOK_PROGRESS_PATH: &str =
  "/book-progress";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum StatsPeriod {
  Total,
  LastWeek,
  LastMonth,
  LastThreeMonths,
  LastYear,
  Custom
}

impl StatsPeriod {
  pub const ALL: [Self; 6] = [
    Self::Total,
    Self::LastWeek,
    Self::LastMonth,
    Self::LastThreeMonths,
    Self::LastYear,
    Self::Custom
  ];

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Total => "total",
      | Self::LastWeek => "last_week",
      | Self::LastMonth => "last_month",
      | Self::LastThreeMonths => {
        "last_three_months"
      }
      | Self::LastYear => "last_year",
      | Self::Custom => "custom"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Total => "All time",
      | Self::LastWeek => "Last week",
      | Self::LastMonth => "Last month",
      | Self::LastThreeMonths => {
        "Last 3 months"
      }
      | Self::LastYear => "Last year",
      | Self::Custom => "Custom range"
    }
  }

  pub fn parse(raw: &str) -> Option<Self> {
    Self::ALL
      .into_iter()
      .find(|period| {
        period.as_key() == raw.trim()
      })
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq, Error,
)]
pub enum RangeError {
  #[error(
    "Please select both a start and an \
     end date"
  )]
  Missing,
  #[error(
    "Start date cannot be after end date"
  )]
  Inverted
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct StatsRange {
  pub start: NaiveDate,
  pub end:   NaiveDate
}

impl StatsRange {
  pub fn custom(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>
  ) -> Result<Self, RangeError> {
    let (Some(start), Some(end)) =
      (start, end)
    else {
      return Err(RangeError::Missing);
    };
    if start > end {
      return Err(RangeError::Inverted);
    }
    Ok(Self {
      start,
      end
    })
  }

  /// The range a custom picker starts
  /// with: the month up to `today`.
  pub fn default_for(
    today: NaiveDate
  ) -> Self {
    Self {
      start: one_month_before(today),
      end:   today
    }
  }
}

/// One statistics request: a named
/// period or an explicit date range.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum StatsQuery {
  Period(StatsPeriod),
  Range(StatsRange)
}

impl StatsQuery {
  /// Builds the query from the period
  /// selector and, for a custom period,
  /// the two date pickers.
  pub fn from_selection(
    period: StatsPeriod,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>
  ) -> Result<Self, RangeError> {
    match period {
      | StatsPeriod::Custom => {
        StatsRange::custom(start, end)
          .map(Self::Range)
      }
      | other => Ok(Self::Period(other))
    }
  }

  pub fn request(self) -> ApiRequest {
    match self {
      | Self::Period(period) => {
        ApiRequest::get(BY_PERIOD_PATH)
          .with_query([(
            "period".to_string(),
            period.as_key().to_string()
          )])
      }
      | Self::Range(range) => {
        ApiRequest::get(BY_RANGE_PATH)
          .with_query([
            (
              "startDate".to_string(),
              format_form_date(range.start)
            ),
            (
              "endDate".to_string(),
              format_form_date(range.end)
            ),
          ])
      }
    }
  }
}

pub fn book_progress_request() -> ApiRequest
{
  ApiRequest::get(BOOK_PROGRESS_PATH)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCards {
  pub book_count:    String,
  pub total_minutes: String,
  pub daily_average: String
}

impl From<&StatisticsDto> for StatCards {
  fn from(stats: &StatisticsDto) -> Self {
    Self {
      book_count:    stats
        .book_count
        .to_string(),
      total_minutes: format!(
        "{} mins",
        stats.total_reading_time
      ),
      daily_average: format!(
        "{:.1} mins",
        stats.avg_daily_time
      )
    }
  }
}

/// Minutes read per day, paired up for
/// the bar chart. Extra entries on
/// either side are dropped.
pub fn daily_series(
  stats: &StatisticsDto
) -> Vec<(String, u64)> {
  stats
    .dates
    .iter()
    .cloned()
    .zip(stats.reading_times.iter().copied())
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
  pub title: String,
  pub width: f64,
  pub label: String
}

/// Width is clamped to 0..=100; the
/// label shows the rounded raw value.
pub fn progress_bars(
  progress: &BookProgressDto
) -> Vec<ProgressBar> {
  progress
    .book_progress
    .iter()
    .map(|(title, percent)| {
      let width = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
      } else {
        0.0
      };
      ProgressBar {
        title: title.clone(),
        width,
        label: format!(
          "{}%",
          percent.round()
        )
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::*;

  fn day(
    year: i32,
    month: u32,
    date: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date)
      .expect("valid date")
  }

  #[test]
  fn period_keys_round_trip() {
    for period in StatsPeriod::ALL {
      assert_eq!(
        StatsPeriod::parse(period.as_key()),
        Some(period)
      );
    }
    assert_eq!(StatsPeriod::parse("decade"), None);
  }

  #[test]
  fn custom_range_needs_ordered_dates() {
    assert_eq!(
      StatsQuery::from_selection(
        StatsPeriod::Custom,
        Some(day(2024, 2, 1)),
        Some(day(2024, 1, 1))
      ),
      Err(RangeError::Inverted)
    );
    assert_eq!(
      StatsQuery::from_selection(
        StatsPeriod::Custom,
        None,
        Some(day(2024, 1, 1))
      ),
      Err(RangeError::Missing)
    );

    let same_day = StatsQuery::from_selection(
      StatsPeriod::Custom,
      Some(day(2024, 1, 1)),
      Some(day(2024, 1, 1))
    )
    .expect("single day range");
    let request = same_day.request();
    assert_eq!(request.path, BY_RANGE_PATH);
    assert_eq!(
      request.query[0].1,
      "2024-01-01"
    );
  }

  #[test]
  fn named_period_ignores_dates() {
    let request = StatsQuery::from_selection(
      StatsPeriod::LastMonth,
      Some(day(2024, 2, 1)),
      Some(day(2024, 1, 1))
    )
    .expect("named period")
    .request();
    assert_eq!(
      request.query,
      vec![(
        "period".to_string(),
        "last_month".to_string()
      )]
    );
  }

  #[test]
  fn stat_cards_format_minutes() {
    let cards = StatCards::from(&StatisticsDto {
      book_count: 3,
      total_reading_time: 125,
      avg_daily_time: 17.857,
      ..StatisticsDto::default()
    });
    assert_eq!(cards.book_count, "3");
    assert_eq!(cards.total_minutes, "125 mins");
    assert_eq!(cards.daily_average, "17.9 mins");
  }

  #[test]
  fn progress_width_is_clamped_label_is_not() {
    let bars = progress_bars(&BookProgressDto {
      book_progress: BTreeMap::from([
        ("Dune".to_string(), 112.4),
        ("Emma".to_string(), 33.5),
      ])
    });
    assert_eq!(bars[0].width, 100.0);
    assert_eq!(bars[0].label, "112%");
    assert_eq!(bars[1].width, 33.5);
    assert_eq!(bars[1].label, "34%");
  }
}
