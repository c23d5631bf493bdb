use chrono::{
  Local,
  Months,
  NaiveDate
};

pub const FORM_DATE_FORMAT: &str =
  "%Y-%m-%d";
const DISPLAY_DATE_FORMAT: &str =
  "%b %-d, %Y";

#[must_use]
pub fn today() -> NaiveDate {
  Local::now().date_naive()
}

/// Parses the value of a date input.
/// Anything after a `T` is ignored so
/// that timestamps coming back from the
/// server can be fed straight in.
pub fn parse_form_date(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  let day = trimmed
    .split_once('T')
    .map_or(trimmed, |(day, _)| day);

  NaiveDate::parse_from_str(
    day,
    FORM_DATE_FORMAT
  )
  .ok()
}

#[must_use]
pub fn format_form_date(
  date: NaiveDate
) -> String {
  date
    .format(FORM_DATE_FORMAT)
    .to_string()
}

#[must_use]
pub fn format_display_date(
  date: NaiveDate
) -> String {
  date
    .format(DISPLAY_DATE_FORMAT)
    .to_string()
}

/// Start of the default custom range on
/// the progress page: one calendar month
/// before `today`.
#[must_use]
pub fn one_month_before(
  today: NaiveDate
) -> NaiveDate {
  today
    .checked_sub_months(Months::new(1))
    .unwrap_or(today)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn form_date_accepts_plain_dates_and_timestamps()
   {
    let expected =
      NaiveDate::from_ymd_opt(2024, 3, 9);
    assert_eq!(
      parse_form_date("2024-03-09"),
      expected
    );
    assert_eq!(
      parse_form_date(
        " 2024-03-09T08:15:00 "
      ),
      expected
    );
    assert_eq!(parse_form_date(""), None);
    assert_eq!(
      parse_form_date("09/03/2024"),
      None
    );
  }

  #[test]
  fn month_before_clamps_to_month_end() {
    let today =
      NaiveDate::from_ymd_opt(2024, 3, 31)
        .expect("valid date");
    assert_eq!(
      one_month_before(today),
      NaiveDate::from_ymd_opt(2024, 2, 29)
        .expect("valid date")
    );
  }
}
