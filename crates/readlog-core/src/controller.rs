//! The list page state machine.
//!
//! `ListController` never performs I/O.
//! Each `begin_*` method moves the phase
//! forward and hands back the request to
//! send; the matching `finish_*` method
//! takes the response and settles the
//! state. [`crate::session::ListSession`]
//! wires the two halves to a transport.

use chrono::NaiveDate;
use readlog_shared::HistoryEntryDto;
use tracing::{
  debug,
  info,
  warn
};

use crate::config::{
  EditSource,
  PageConfig
};
use crate::error::ApiError;
use crate::feedback::{
  ConfirmRequest,
  Severity
};
use crate::filter::FilterCriteria;
use crate::form::{
  FormDraft,
  FormField,
  PageMismatch,
  ValidationErrors,
  find_page_mismatch,
  has_changes
};
use crate::http::{
  ApiRequest,
  RawResponse,
  RecordEndpoints
};
use crate::record::{
  Record,
  RecordDraft,
  RecordId
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Loading,
  Loaded,
  Error(String),
  Filtering,
  Submitting,
  ValidationError
}

impl Phase {
  pub fn is_busy(&self) -> bool {
    matches!(
      self,
      Self::Loading
        | Self::Filtering
        | Self::Submitting
    )
  }
}

/// A message meant for a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub message:  String,
  pub severity: Severity
}

impl Notice {
  pub fn success(
    message: impl Into<String>
  ) -> Self {
    Self {
      message:  message.into(),
      severity: Severity::Success
    }
  }

  pub fn error(
    message: impl Into<String>
  ) -> Self {
    Self {
      message:  message.into(),
      severity: Severity::Error
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum FormMode {
  Create,
  Edit(RecordId)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
  pub mode:   FormMode,
  pub draft:  FormDraft,
  pub errors: ValidationErrors,
  original:   Option<Record>
}

impl FormState {
  pub fn heading(&self) -> &'static str {
    match self.mode {
      | FormMode::Create => {
        "Add New Reading Log"
      }
      | FormMode::Edit(_) => {
        "Edit Reading Log"
      }
    }
  }

  pub fn submit_label(&self) -> &'static str {
    match self.mode {
      | FormMode::Create => "Add Log",
      | FormMode::Edit(_) => "Update Log"
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStep {
  /// No form is open.
  Closed,
  /// Field errors were recorded on the
  /// form.
  Invalid,
  /// An edit changed nothing; the form
  /// was closed without a request.
  Unchanged,
  /// Ask before creating a second entry
  /// for a book with another page count.
  ConfirmMismatch(ConfirmRequest),
  /// The request to send; `mode` goes
  /// back into `finish_submit`.
  Send {
    request: ApiRequest,
    mode:    FormMode
  },
  Rejected(Notice)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
  /// Saved; the collection must be
  /// fetched again.
  Saved(Notice),
  /// The server flagged a field; the
  /// form stays open.
  FieldError(FormField),
  Failed(Notice),
  /// The session expired and the page is
  /// navigating away.
  Abandoned
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOpen {
  Ready,
  Fetch(ApiRequest)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum FilterOutcome {
  Remote,
  Local
}

#[derive(Debug, Clone)]
pub struct ListController {
  page:           PageConfig,
  endpoints:      RecordEndpoints,
  phase:          Phase,
  records:        Vec<Record>,
  visible:        Vec<Record>,
  criteria:       FilterCriteria,
  form:           Option<FormState>,
  pending_create: Option<RecordDraft>,
  details:        Option<Record>,
  history:        Option<Vec<HistoryEntryDto>>
}

impl ListController {
  pub fn new(page: PageConfig) -> Self {
    let endpoints = page.endpoints();
    Self {
      page,
      endpoints,
      phase: Phase::Idle,
      records: Vec::new(),
      visible: Vec::new(),
      criteria: FilterCriteria::default(),
      form: None,
      pending_create: None,
      details: None,
      history: None
    }
  }

  pub fn page(&self) -> &PageConfig {
    &self.page
  }

  pub fn phase(&self) -> &Phase {
    &self.phase
  }

  /// The last collection the server
  /// returned.
  pub fn records(&self) -> &[Record] {
    &self.records
  }

  /// What the list shows right now.
  pub fn visible(&self) -> &[Record] {
    &self.visible
  }

  pub fn criteria(&self) -> &FilterCriteria {
    &self.criteria
  }

  pub fn form(&self) -> Option<&FormState> {
    self.form.as_ref()
  }

  pub fn details(&self) -> Option<&Record> {
    self.details.as_ref()
  }

  pub fn history(
    &self
  ) -> Option<&[HistoryEntryDto]> {
    self.history.as_deref()
  }

  pub fn begin_fetch(
    &mut self
  ) -> ApiRequest {
    self.phase = Phase::Loading;
    self.endpoints.list()
  }

  #[tracing::instrument(skip_all, fields(page = %self.page.key))]
  pub fn finish_fetch(
    &mut self,
    result: Result<Vec<Record>, ApiError>
  ) -> Option<Notice> {
    match result {
      | Ok(records) => {
        info!(
          count = records.len(),
          "records loaded"
        );
        self.visible =
          self.criteria.apply(&records);
        self.records = records;
        self.phase = Phase::Loaded;
        None
      }
      | Err(error) => {
        warn!(%error, "failed to load records");
        let message = error.user_message(
          &self.page.labels.load_failed
        );
        self.phase =
          Phase::Error(message.clone());
        if error.is_unauthorized() {
          None
        } else {
          Some(Notice::error(
            self.page.labels.load_failed.clone()
          ))
        }
      }
    }
  }

  pub fn begin_filter(
    &mut self,
    criteria: FilterCriteria
  ) -> ApiRequest {
    self.criteria = criteria;
    self.phase = Phase::Filtering;
    self.endpoints.filter(&self.criteria)
  }

  /// Settles a filtered-list response.
  /// Any failure other than an expired
  /// session falls back to filtering the
  /// loaded collection.
  #[tracing::instrument(skip_all, fields(page = %self.page.key))]
  pub fn finish_filter(
    &mut self,
    result: Result<Vec<Record>, ApiError>
  ) -> FilterOutcome {
    self.phase = Phase::Loaded;
    match result {
      | Ok(records) => {
        debug!(
          count = records.len(),
          "server filter applied"
        );
        self.visible = records;
        FilterOutcome::Remote
      }
      | Err(error) => {
        if !error.is_unauthorized() {
          warn!(%error, "server filter failed; filtering locally");
        }
        self.visible =
          self.criteria.apply(&self.records);
        FilterOutcome::Local
      }
    }
  }

  /// Search and sort changes that never
  /// leave the page.
  pub fn search_locally(
    &mut self,
    criteria: FilterCriteria
  ) {
    self.criteria = criteria;
    self.visible =
      self.criteria.apply(&self.records);
    if !self.phase.is_busy() {
      self.phase = Phase::Loaded;
    }
  }

  pub fn reset_filters(
    &mut self
  ) -> ApiRequest {
    self.criteria = FilterCriteria::default();
    self.begin_fetch()
  }

  pub fn open_create(
    &mut self,
    today: NaiveDate
  ) {
    self.pending_create = None;
    self.form = Some(FormState {
      mode:     FormMode::Create,
      draft:    FormDraft::default().with(
        FormField::Date,
        crate::datetime::format_form_date(
          today
        )
      ),
      errors:   ValidationErrors::default(),
      original: None
    });
  }

  /// Opens the edit form from the loaded
  /// collection, or asks for the record
  /// to be fetched first.
  pub fn open_edit(
    &mut self,
    id: RecordId
  ) -> EditOpen {
    let loaded = match self.page.edit_source {
      | EditSource::Loaded => self
        .records
        .iter()
        .find(|record| record.id == id)
        .cloned(),
      | EditSource::Remote => None
    };

    match loaded {
      | Some(record) => {
        self.fill_edit_form(record);
        EditOpen::Ready
      }
      | None => {
        EditOpen::Fetch(self.endpoints.get(id))
      }
    }
  }

  pub fn finish_edit_fetch(
    &mut self,
    result: Result<Record, ApiError>
  ) -> Option<Notice> {
    match result {
      | Ok(record) => {
        self.fill_edit_form(record);
        None
      }
      | Err(error) => {
        warn!(%error, "failed to load record for editing");
        (!error.is_unauthorized()).then(
          || {
            Notice::error(
              "Failed to load log for \
               editing"
            )
          }
        )
      }
    }
  }

  fn fill_edit_form(
    &mut self,
    record: Record
  ) {
    self.pending_create = None;
    self.form = Some(FormState {
      mode:     FormMode::Edit(record.id),
      draft:    FormDraft::from_record(
        &record
      ),
      errors:   ValidationErrors::default(),
      original: Some(record)
    });
  }

  pub fn close_form(&mut self) {
    self.form = None;
    self.pending_create = None;
    if self.phase
      == Phase::ValidationError
    {
      self.phase = Phase::Loaded;
    }
  }

  pub fn set_field(
    &mut self,
    field: FormField,
    value: impl Into<String>
  ) {
    if let Some(form) = self.form.as_mut()
    {
      form.draft.set(field, value);
    }
  }

  /// Live validation for one field,
  /// run after the input settles.
  pub fn revalidate_field(
    &mut self,
    field: FormField,
    today: NaiveDate
  ) {
    let Some(form) = self.form.as_mut()
    else {
      return;
    };
    match form
      .draft
      .validate_field(field, today)
    {
      | Some(message) => {
        form.errors.insert(field, message)
      }
      | None => form.errors.remove(field)
    }
  }

  /// Validates the open form and decides
  /// what happens next. Nothing here
  /// touches the network.
  #[tracing::instrument(skip_all, fields(page = %self.page.key))]
  pub fn prepare_submit(
    &mut self,
    today: NaiveDate
  ) -> SubmitStep {
    let Some(form) = self.form.as_mut()
    else {
      return SubmitStep::Closed;
    };

    let draft =
      match form.draft.validate(today) {
        | Ok(draft) => draft,
        | Err(errors) => {
          debug!(%errors, "form rejected locally");
          form.errors = errors;
          self.phase = Phase::ValidationError;
          return SubmitStep::Invalid;
        }
      };
    form.errors.clear();

    let mode = form.mode;
    let unchanged = matches!(
      mode,
      FormMode::Edit(_)
    ) && form
      .original
      .as_ref()
      .is_some_and(|original| {
        !has_changes(original, &draft)
      });

    if unchanged {
      debug!("edit changed nothing; closing form");
      self.close_form();
      return SubmitStep::Unchanged;
    }

    if mode == FormMode::Create
      && let Some(mismatch) =
        find_page_mismatch(
          &self.records,
          &draft
        )
    {
      info!(
        existing = mismatch.existing,
        attempted = mismatch.attempted,
        "page count differs from earlier entry"
      );
      self.pending_create = Some(draft);
      return SubmitStep::ConfirmMismatch(
        mismatch_confirmation(mismatch)
      );
    }

    self.send_draft(mode, &draft)
  }

  /// The user accepted the page-count
  /// mismatch.
  pub fn proceed_after_mismatch(
    &mut self
  ) -> SubmitStep {
    match self.pending_create.take() {
      | Some(draft) => self
        .send_draft(FormMode::Create, &draft),
      | None => SubmitStep::Closed
    }
  }

  /// The user declined; the form stays
  /// open and nothing is sent.
  pub fn abandon_mismatch(&mut self) {
    self.pending_create = None;
    self.phase = Phase::Loaded;
  }

  fn send_draft(
    &mut self,
    mode: FormMode,
    draft: &RecordDraft
  ) -> SubmitStep {
    let request = match mode {
      | FormMode::Create => {
        self.endpoints.create(draft)
      }
      | FormMode::Edit(id) => {
        self.endpoints.update(id, draft)
      }
    };

    match request {
      | Ok(request) => {
        self.phase = Phase::Submitting;
        SubmitStep::Send { request, mode }
      }
      | Err(error) => {
        warn!(%error, "could not encode record");
        self.phase = Phase::Loaded;
        SubmitStep::Rejected(Notice::error(
          self.page.labels.save_failed.clone()
        ))
      }
    }
  }

  #[tracing::instrument(skip_all, fields(page = %self.page.key))]
  pub fn finish_submit(
    &mut self,
    mode: FormMode,
    result: Result<RawResponse, ApiError>
  ) -> SubmitOutcome {
    match result {
      | Ok(_) => {
        info!(?mode, "record saved");
        self.form = None;
        self.phase = Phase::Loaded;
        let message = match mode {
          | FormMode::Create => {
            &self.page.labels.created
          }
          | FormMode::Edit(_) => {
            &self.page.labels.updated
          }
        };
        SubmitOutcome::Saved(Notice::success(
          message.clone()
        ))
      }
      | Err(ApiError::Conflict(conflict)) => {
        let field = conflict.field();
        debug!(%conflict, "server reported conflict");
        if let Some(form) = self.form.as_mut()
        {
          form.errors.clear();
          form
            .errors
            .insert(field, conflict.to_string());
        }
        self.phase = Phase::ValidationError;
        SubmitOutcome::FieldError(field)
      }
      | Err(ApiError::Unauthorized) => {
        self.phase = Phase::Loaded;
        SubmitOutcome::Abandoned
      }
      | Err(error) => {
        warn!(%error, "save failed");
        self.phase = Phase::Loaded;
        SubmitOutcome::Failed(Notice::error(
          error.user_message(
            &self.page.labels.save_failed
          )
        ))
      }
    }
  }

  /// The confirmation shown before a
  /// delete or restore.
  pub fn delete_confirmation(
    &self
  ) -> ConfirmRequest {
    self.page.labels.delete_confirm.clone()
  }

  pub fn begin_delete(
    &mut self,
    id: RecordId
  ) -> ApiRequest {
    self.phase = Phase::Submitting;
    self.endpoints.delete(id)
  }

  /// On success the caller re-fetches;
  /// on failure the list is left alone.
  #[tracing::instrument(skip_all, fields(page = %self.page.key))]
  pub fn finish_delete(
    &mut self,
    result: Result<RawResponse, ApiError>
  ) -> Result<Notice, Option<Notice>> {
    self.phase = Phase::Loaded;
    match result {
      | Ok(_) => {
        self.details = None;
        self.history = None;
        Ok(Notice::success(
          self.page.labels.deleted.clone()
        ))
      }
      | Err(ApiError::Unauthorized) => {
        Err(None)
      }
      | Err(error) => {
        warn!(%error, "delete failed");
        Err(Some(Notice::error(
          error.user_message(
            &self.page.labels.delete_failed
          )
        )))
      }
    }
  }

  pub fn begin_details(
    &mut self,
    id: RecordId
  ) -> ApiRequest {
    self.history = None;
    self.endpoints.get(id)
  }

  pub fn finish_details(
    &mut self,
    result: Result<Record, ApiError>
  ) -> Option<Notice> {
    match result {
      | Ok(record) => {
        self.details = Some(record);
        None
      }
      | Err(error) => {
        warn!(%error, "failed to load details");
        (!error.is_unauthorized()).then(
          || {
            Notice::error(
              self
                .page
                .labels
                .details_failed
                .clone()
            )
          }
        )
      }
    }
  }

  pub fn close_details(&mut self) {
    self.details = None;
    self.history = None;
  }

  /// `None` when the page has no history
  /// view or no record is open.
  pub fn begin_history(
    &self
  ) -> Option<ApiRequest> {
    if !self.page.history {
      return None;
    }
    self
      .details
      .as_ref()
      .map(|record| {
        self.endpoints.history(record)
      })
  }

  pub fn finish_history(
    &mut self,
    result: Result<
      Vec<HistoryEntryDto>,
      ApiError
    >
  ) -> Option<Notice> {
    match result {
      | Ok(mut entries) => {
        let current =
          self.details.as_ref().map(
            |record| record.id
          );
        for entry in &mut entries {
          entry.is_current = entry.is_current
            || Some(entry.id) == current;
        }
        self.history = Some(entries);
        None
      }
      | Err(error) => {
        warn!(%error, "failed to load history");
        self.history = Some(Vec::new());
        (!error.is_unauthorized()).then(
          || {
            Notice::error(error.user_message(
              "Failed to load reading \
               history"
            ))
          }
        )
      }
    }
  }

  pub fn hide_history(&mut self) {
    self.history = None;
  }
}

fn mismatch_confirmation(
  mismatch: PageMismatch
) -> ConfirmRequest {
  ConfirmRequest {
    title:         "Page Count Mismatch"
      .to_string(),
    message:       format!(
      "This book is already recorded with \
       {} pages, but you entered {}. Save \
       this entry anyway?",
      mismatch.existing, mismatch.attempted
    ),
    confirm_label: "Save Anyway".to_string(),
    danger:        false
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::Method;
  use crate::record::sample;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1)
      .expect("valid date")
  }

  fn loaded(
    records: Vec<Record>
  ) -> ListController {
    let mut controller =
      ListController::new(PageConfig {
        edit_source: EditSource::Loaded,
        ..PageConfig::default()
      });
    controller.begin_fetch();
    controller.finish_fetch(Ok(records));
    controller
  }

  #[test]
  fn fetch_moves_through_loading_to_loaded() {
    let mut controller =
      ListController::new(PageConfig::default());
    assert_eq!(controller.phase(), &Phase::Idle);

    let request = controller.begin_fetch();
    assert_eq!(request.path, "/api/reading-logs");
    assert_eq!(
      controller.phase(),
      &Phase::Loading
    );

    let notice = controller.finish_fetch(Err(
      ApiError::Transport("offline".into())
    ));
    assert_eq!(
      notice.map(|notice| notice.message),
      Some("Failed to load logs".to_string())
    );
    assert!(matches!(
      controller.phase(),
      Phase::Error(_)
    ));
  }

  #[test]
  fn failed_remote_filter_falls_back_to_local()
   {
    let mut controller = loaded(vec![
      sample(1, "Dune", "Herbert"),
      sample(2, "Emma", "Austen"),
    ]);

    let request = controller.begin_filter(
      FilterCriteria::with_query("dune")
    );
    assert_eq!(
      request.query,
      vec![(
        "query".to_string(),
        "dune".to_string()
      )]
    );
    assert_eq!(
      controller.phase(),
      &Phase::Filtering
    );

    let outcome = controller.finish_filter(
      Err(ApiError::Server {
        status:  500,
        message: "boom".to_string()
      })
    );
    assert_eq!(outcome, FilterOutcome::Local);
    assert_eq!(controller.visible().len(), 1);
    assert_eq!(controller.records().len(), 2);
    assert_eq!(
      controller.phase(),
      &Phase::Loaded
    );
  }

  #[test]
  fn unchanged_edit_closes_without_request() {
    let mut controller =
      loaded(vec![sample(7, "Dune", "Herbert")]);
    assert_eq!(
      controller.open_edit(7),
      EditOpen::Ready
    );
    assert_eq!(
      controller.prepare_submit(today()),
      SubmitStep::Unchanged
    );
    assert!(controller.form().is_none());
  }

  #[test]
  fn remote_edit_source_fetches_by_id() {
    let mut controller =
      ListController::new(PageConfig::default());
    controller.finish_fetch(Ok(vec![sample(
      7, "Dune", "Herbert"
    )]));

    let EditOpen::Fetch(request) =
      controller.open_edit(7)
    else {
      panic!("expected a fetch");
    };
    assert_eq!(
      request.path,
      "/api/reading-logs/7"
    );

    controller.finish_edit_fetch(Ok(sample(
      7, "Dune", "Herbert"
    )));
    controller.set_field(
      FormField::TimeSpent,
      "90"
    );
    let SubmitStep::Send { request, mode } =
      controller.prepare_submit(today())
    else {
      panic!("expected a request");
    };
    assert_eq!(request.method, Method::Put);
    assert_eq!(mode, FormMode::Edit(7));
    assert_eq!(
      controller.phase(),
      &Phase::Submitting
    );
  }

  #[test]
  fn overlapping_saves_keep_their_own_labels() {
    let mut controller = loaded(vec![sample(
      7, "Dune", "Herbert"
    )]);

    controller.open_create(today());
    for (field, value) in [
      (FormField::Title, "Emma"),
      (FormField::Author, "Austen"),
      (FormField::TimeSpent, "20")
    ] {
      controller.set_field(field, value);
    }
    let SubmitStep::Send {
      mode: create, ..
    } = controller.prepare_submit(today())
    else {
      panic!("expected a create");
    };

    assert_eq!(
      controller.open_edit(7),
      EditOpen::Ready
    );
    controller.set_field(
      FormField::TimeSpent,
      "90"
    );
    let SubmitStep::Send { mode: edit, .. } =
      controller.prepare_submit(today())
    else {
      panic!("expected an update");
    };

    let edited = controller.finish_submit(
      edit,
      Ok(RawResponse {
        status: 200,
        body:   String::new()
      })
    );
    let created = controller.finish_submit(
      create,
      Ok(RawResponse {
        status: 201,
        body:   String::new()
      })
    );

    let labels = &controller.page().labels;
    assert_eq!(
      edited,
      SubmitOutcome::Saved(Notice::success(
        labels.updated.clone()
      ))
    );
    assert_eq!(
      created,
      SubmitOutcome::Saved(Notice::success(
        labels.created.clone()
      ))
    );
  }

  #[test]
  fn live_validation_sets_and_clears_field_error()
   {
    let mut controller = loaded(Vec::new());
    controller.open_create(today());
    controller.set_field(
      FormField::Date,
      "2030-01-01"
    );
    controller
      .revalidate_field(FormField::Date, today());
    assert_eq!(
      controller
        .form()
        .and_then(|form| {
          form.errors.get(FormField::Date)
        }),
      Some("Date cannot be in the future")
    );

    controller.set_field(
      FormField::Date,
      "2024-05-01"
    );
    controller
      .revalidate_field(FormField::Date, today());
    assert!(
      controller
        .form()
        .is_some_and(|form| {
          form.errors.is_empty()
        })
    );
  }

  #[test]
  fn delete_failure_leaves_list_untouched() {
    let mut controller = loaded(vec![sample(
      3, "Dune", "Herbert"
    )]);
    let request = controller.begin_delete(3);
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.body, None);

    let result = controller.finish_delete(Err(
      ApiError::NotFound {
        message: "Reading log not found"
          .to_string()
      }
    ));
    assert_eq!(
      result,
      Err(Some(Notice::error(
        "Reading log not found"
      )))
    );
    assert_eq!(controller.visible().len(), 1);
  }

  #[test]
  fn history_marks_current_record() {
    let mut controller = loaded(Vec::new());
    controller.finish_details(Ok(sample(
      2, "Dune", "Herbert"
    )));
    let request = controller
      .begin_history()
      .expect("history enabled");
    assert!(request.query.contains(&(
      "currentLogId".to_string(),
      "2".to_string()
    )));

    let entry = |id| HistoryEntryDto {
      id,
      title: "Dune".to_string(),
      author: "Herbert".to_string(),
      date: NaiveDate::from_ymd_opt(2024, 1, 1),
      time_spent: Some(30),
      current_page: None,
      total_pages: None,
      notes: None,
      is_current: false
    };
    controller
      .finish_history(Ok(vec![entry(1), entry(2)]));
    let flags: Vec<bool> = controller
      .history()
      .unwrap_or_default()
      .iter()
      .map(|entry| entry.is_current)
      .collect();
    assert_eq!(flags, vec![false, true]);
  }
}
