use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::datetime::{
  format_form_date,
  parse_form_date
};
use crate::record::{
  Record,
  RecordDraft,
  RecordExt
};

pub const NOTES_MAX_CHARS: usize =
  65_535;

/// The fields of the record form, in
/// display order. Each one knows how to
/// read itself out of a [`Record`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub enum FormField {
  Title,
  Author,
  Date,
  TimeSpent,
  CurrentPage,
  TotalPages,
  Notes
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum InputKind {
  Text,
  Date,
  Number,
  TextArea
}

impl FormField {
  pub const ALL: [Self; 7] = [
    Self::Title,
    Self::Author,
    Self::Date,
    Self::TimeSpent,
    Self::CurrentPage,
    Self::TotalPages,
    Self::Notes
  ];

  pub fn key(self) -> &'static str {
    match self {
      | Self::Title => "title",
      | Self::Author => "author",
      | Self::Date => "date",
      | Self::TimeSpent => "timeSpent",
      | Self::CurrentPage => "currentPage",
      | Self::TotalPages => "totalPages",
      | Self::Notes => "notes"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Title => "Title",
      | Self::Author => "Author",
      | Self::Date => "Date",
      | Self::TimeSpent => {
        "Time spent (minutes)"
      }
      | Self::CurrentPage => "Current page",
      | Self::TotalPages => "Total pages",
      | Self::Notes => "Notes"
    }
  }

  pub fn input(self) -> InputKind {
    match self {
      | Self::Title | Self::Author => {
        InputKind::Text
      }
      | Self::Date => InputKind::Date,
      | Self::TimeSpent
      | Self::CurrentPage
      | Self::TotalPages => {
        InputKind::Number
      }
      | Self::Notes => InputKind::TextArea
    }
  }

  pub fn required(self) -> bool {
    matches!(
      self,
      Self::Title
        | Self::Author
        | Self::Date
        | Self::TimeSpent
    )
  }

  pub fn read(
    self,
    record: &Record
  ) -> String {
    match self {
      | Self::Title => record.title.clone(),
      | Self::Author => {
        record.author.clone()
      }
      | Self::Date => record
        .day()
        .map(format_form_date)
        .unwrap_or_default(),
      | Self::TimeSpent => {
        record.time_spent.to_string()
      }
      | Self::CurrentPage => record
        .current_page
        .map(|page| page.to_string())
        .unwrap_or_default(),
      | Self::TotalPages => record
        .total_pages
        .map(|page| page.to_string())
        .unwrap_or_default(),
      | Self::Notes => record
        .notes
        .clone()
        .unwrap_or_default()
    }
  }
}

/// Field-scoped messages that block
/// submission.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Error,
)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(
  BTreeMap<FormField, String>
);

impl ValidationErrors {
  pub fn insert(
    &mut self,
    field: FormField,
    message: impl Into<String>
  ) {
    self.0.insert(field, message.into());
  }

  pub fn get(
    &self,
    field: FormField
  ) -> Option<&str> {
    self.0.get(&field).map(String::as_str)
  }

  pub fn remove(
    &mut self,
    field: FormField
  ) {
    self.0.remove(&field);
  }

  pub fn clear(&mut self) {
    self.0.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (FormField, &str)>
  {
    self
      .0
      .iter()
      .map(|(field, message)| {
        (*field, message.as_str())
      })
  }
}

/// Raw input values for the record
/// form, keyed by field.
#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct FormDraft {
  values: BTreeMap<FormField, String>
}

impl FormDraft {
  pub fn from_record(
    record: &Record
  ) -> Self {
    let values = FormField::ALL
      .iter()
      .map(|field| {
        (*field, field.read(record))
      })
      .collect();
    Self {
      values
    }
  }

  pub fn get(
    &self,
    field: FormField
  ) -> &str {
    self
      .values
      .get(&field)
      .map_or("", String::as_str)
  }

  pub fn set(
    &mut self,
    field: FormField,
    value: impl Into<String>
  ) {
    self.values.insert(field, value.into());
  }

  pub fn with(
    mut self,
    field: FormField,
    value: impl Into<String>
  ) -> Self {
    self.set(field, value);
    self
  }

  /// Checks every field and builds the
  /// request body when nothing is wrong.
  pub fn validate(
    &self,
    today: NaiveDate
  ) -> Result<RecordDraft, ValidationErrors>
  {
    let mut errors =
      ValidationErrors::default();

    let title =
      self.get(FormField::Title).trim();
    if title.is_empty() {
      errors.insert(
        FormField::Title,
        "Title is required"
      );
    }

    let author =
      self.get(FormField::Author).trim();
    if author.is_empty() {
      errors.insert(
        FormField::Author,
        "Author is required"
      );
    }

    let raw_date = self.get(FormField::Date);
    let date = if raw_date.trim().is_empty()
    {
      errors.insert(
        FormField::Date,
        "Date is required"
      );
      None
    } else {
      match parse_form_date(raw_date) {
        | Some(date) if date > today => {
          errors.insert(
            FormField::Date,
            "Date cannot be in the future"
          );
          None
        }
        | Some(date) => Some(date),
        | None => {
          errors.insert(
            FormField::Date,
            "Enter the date as YYYY-MM-DD"
          );
          None
        }
      }
    };

    let time_spent = match parse_count(
      self.get(FormField::TimeSpent),
      0
    ) {
      | Ok(Some(minutes)) => Some(minutes),
      | Ok(None) => {
        errors.insert(
          FormField::TimeSpent,
          "Time spent is required"
        );
        None
      }
      | Err(()) => {
        errors.insert(
          FormField::TimeSpent,
          "Time spent must be a whole \
           number of minutes"
        );
        None
      }
    };

    let current_page = self.page(
      FormField::CurrentPage,
      "Current page",
      &mut errors
    );
    let total_pages = self.page(
      FormField::TotalPages,
      "Total pages",
      &mut errors
    );
    if let (Some(current), Some(total)) =
      (current_page, total_pages)
      && current > total
    {
      errors.insert(
        FormField::CurrentPage,
        "Current page cannot exceed \
         total pages"
      );
    }

    let notes =
      self.get(FormField::Notes).trim();
    if notes.chars().count()
      > NOTES_MAX_CHARS
    {
      errors.insert(
        FormField::Notes,
        "Notes are too long"
      );
    }

    match (date, time_spent) {
      | (Some(date), Some(time_spent))
        if errors.is_empty() =>
      {
        Ok(RecordDraft {
          title: title.to_string(),
          author: author.to_string(),
          date,
          time_spent,
          current_page,
          total_pages,
          notes: notes.to_string()
        })
      }
      | _ => Err(errors)
    }
  }

  /// The message a single field shows
  /// during live validation.
  pub fn validate_field(
    &self,
    field: FormField,
    today: NaiveDate
  ) -> Option<String> {
    self
      .validate(today)
      .err()
      .and_then(|errors| {
        errors
          .get(field)
          .map(str::to_string)
      })
  }

  fn page(
    &self,
    field: FormField,
    label: &str,
    errors: &mut ValidationErrors
  ) -> Option<u32> {
    match parse_count(self.get(field), 1) {
      | Ok(page) => page,
      | Err(()) => {
        errors.insert(
          field,
          format!(
            "{label} must be a positive \
             whole number"
          )
        );
        None
      }
    }
  }
}

fn parse_count(
  raw: &str,
  min: u32
) -> Result<Option<u32>, ()> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }
  match trimmed.parse::<u32>() {
    | Ok(value) if value >= min => {
      Ok(Some(value))
    }
    | _ => Err(())
  }
}

/// Whether submitting `draft` would
/// change anything about `original`.
pub fn has_changes(
  original: &Record,
  draft: &RecordDraft
) -> bool {
  original.title != draft.title
    || original.author != draft.author
    || original.day() != Some(draft.date)
    || original.time_spent
      != draft.time_spent
    || original.current_page
      != draft.current_page
    || original.total_pages
      != draft.total_pages
    || original.notes.as_deref().unwrap_or("")
      != draft.notes
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct PageMismatch {
  pub existing:  u32,
  pub attempted: u32
}

/// Looks through already-loaded records
/// for the same book recorded with a
/// different total page count.
pub fn find_page_mismatch(
  records: &[Record],
  draft: &RecordDraft
) -> Option<PageMismatch> {
  let attempted = draft.total_pages?;
  records
    .iter()
    .filter(|record| {
      record.is_same_book(
        &draft.title,
        &draft.author
      )
    })
    .find_map(|record| {
      record
        .total_pages
        .filter(|existing| {
          *existing != attempted
        })
        .map(|existing| PageMismatch {
          existing,
          attempted
        })
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::sample;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1)
      .expect("valid date")
  }

  fn dune() -> FormDraft {
    FormDraft::default()
      .with(FormField::Title, "Dune")
      .with(FormField::Author, "Herbert")
      .with(FormField::Date, "2024-01-01")
      .with(FormField::TimeSpent, "45")
      .with(FormField::CurrentPage, "50")
      .with(FormField::TotalPages, "50")
  }

  #[test]
  fn valid_draft_builds_request_body() {
    let draft = dune()
      .with(FormField::Notes, "  loved it ")
      .validate(today())
      .expect("valid draft");

    assert_eq!(draft.title, "Dune");
    assert_eq!(draft.time_spent, 45);
    assert_eq!(draft.total_pages, Some(50));
    assert_eq!(draft.notes, "loved it");
  }

  #[test]
  fn current_page_above_total_is_flagged_on_current_page()
   {
    let errors = dune()
      .with(FormField::CurrentPage, "51")
      .validate(today())
      .expect_err("must fail");

    assert_eq!(
      errors.get(FormField::CurrentPage),
      Some(
        "Current page cannot exceed total \
         pages"
      )
    );
    assert_eq!(
      errors.get(FormField::TotalPages),
      None
    );
  }

  #[test]
  fn missing_title_author_and_future_date_are_reported_together()
   {
    let errors = dune()
      .with(FormField::Title, "  ")
      .with(FormField::Author, "")
      .with(FormField::Date, "2024-06-02")
      .validate(today())
      .expect_err("must fail");

    assert_eq!(
      errors.get(FormField::Title),
      Some("Title is required")
    );
    assert_eq!(
      errors.get(FormField::Author),
      Some("Author is required")
    );
    assert_eq!(
      errors.get(FormField::Date),
      Some("Date cannot be in the future")
    );
  }

  #[test]
  fn today_is_not_in_the_future() {
    assert!(
      dune()
        .with(FormField::Date, "2024-06-01")
        .validate(today())
        .is_ok()
    );
  }

  #[test]
  fn page_fields_are_optional_but_positive()
   {
    let draft = dune()
      .with(FormField::CurrentPage, "")
      .with(FormField::TotalPages, "")
      .validate(today())
      .expect("pages optional");
    assert_eq!(draft.current_page, None);

    let errors = dune()
      .with(FormField::TotalPages, "0")
      .validate(today())
      .expect_err("zero pages");
    assert!(
      errors
        .get(FormField::TotalPages)
        .is_some()
    );
  }

  #[test]
  fn live_validation_reports_single_field()
   {
    let draft =
      dune().with(FormField::TimeSpent, "-4");
    assert!(
      draft
        .validate_field(
          FormField::TimeSpent,
          today()
        )
        .is_some()
    );
    assert_eq!(
      draft.validate_field(
        FormField::Title,
        today()
      ),
      None
    );
  }

  #[test]
  fn form_round_trips_through_record() {
    let mut record = sample(4, "Dune", "Herbert");
    record.current_page = Some(10);
    record.total_pages = Some(200);
    let form = FormDraft::from_record(&record);

    assert_eq!(
      form.get(FormField::Date),
      "2024-01-01"
    );
    assert_eq!(
      form.get(FormField::TotalPages),
      "200"
    );

    let draft = form
      .validate(today())
      .expect("record form is valid");
    assert!(!has_changes(&record, &draft));

    let edited = form
      .with(FormField::CurrentPage, "11")
      .validate(today())
      .expect("edited form is valid");
    assert!(has_changes(&record, &edited));
  }

  #[test]
  fn mismatch_detected_for_same_book_only() {
    let mut existing =
      sample(1, "dune", "herbert");
    existing.total_pages = Some(200);
    let mut other =
      sample(2, "Dune Messiah", "Herbert");
    other.total_pages = Some(300);
    let draft = dune()
      .validate(today())
      .expect("valid draft");

    assert_eq!(
      find_page_mismatch(
        &[other.clone(), existing],
        &draft
      ),
      Some(PageMismatch {
        existing:  200,
        attempted: 50
      })
    );
    assert_eq!(
      find_page_mismatch(&[other], &draft),
      None
    );
  }
}
