use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::NaiveDate;
use readlog_shared::HistoryEntryDto;
use tracing::{
  debug,
  info
};

use crate::config::PageConfig;
use crate::controller::{
  EditOpen,
  FilterOutcome,
  ListController,
  Notice,
  SubmitOutcome,
  SubmitStep
};
use crate::datetime;
use crate::feedback::{
  ConfirmRequest,
  Severity
};
use crate::filter::FilterCriteria;
use crate::form::FormField;
use crate::http::{
  ApiClient,
  Transport
};
use crate::record::{
  Record,
  RecordId
};

/// Toasts and confirmations as seen by
/// the list session.
#[async_trait(?Send)]
pub trait Feedback {
  fn toast(
    &self,
    message: &str,
    severity: Severity
  );

  /// Resolves once, `true` only when the
  /// user confirmed.
  async fn confirm(
    &self,
    request: ConfirmRequest
  ) -> bool;
}

/// Drives one [`ListController`] against
/// a transport. The controller is only
/// borrowed between awaits, and the
/// change hook runs after each borrow is
/// released.
pub struct ListSession<T, F> {
  client:     ApiClient<T>,
  feedback:   F,
  controller: RefCell<ListController>,
  today:      fn() -> NaiveDate,
  on_change:  RefCell<Option<Rc<dyn Fn()>>>
}

impl<T, F> ListSession<T, F>
where
  T: Transport,
  F: Feedback
{
  pub fn new(
    client: ApiClient<T>,
    feedback: F,
    page: PageConfig
  ) -> Self {
    Self {
      client,
      feedback,
      controller: RefCell::new(
        ListController::new(page)
      ),
      today: datetime::today,
      on_change: RefCell::new(None)
    }
  }

  pub fn with_clock(
    mut self,
    today: fn() -> NaiveDate
  ) -> Self {
    self.today = today;
    self
  }

  pub fn set_on_change(
    &self,
    hook: Rc<dyn Fn()>
  ) {
    *self.on_change.borrow_mut() =
      Some(hook);
  }

  pub fn client(&self) -> &ApiClient<T> {
    &self.client
  }

  pub fn feedback(&self) -> &F {
    &self.feedback
  }

  pub fn read<R>(
    &self,
    view: impl FnOnce(&ListController) -> R
  ) -> R {
    view(&*self.controller.borrow())
  }

  fn update<R>(
    &self,
    change: impl FnOnce(
      &mut ListController
    ) -> R
  ) -> R {
    let out =
      change(&mut *self.controller.borrow_mut());
    self.notify();
    out
  }

  fn notify(&self) {
    let hook = self.on_change.borrow().clone();
    if let Some(hook) = hook {
      hook();
    }
  }

  fn announce(&self, notice: Option<Notice>) {
    if let Some(notice) = notice {
      self
        .feedback
        .toast(&notice.message, notice.severity);
    }
  }

  #[tracing::instrument(skip(self))]
  pub async fn load(&self) {
    let request =
      self.update(ListController::begin_fetch);
    let result = self
      .client
      .fetch_json::<Vec<Record>>(&request)
      .await;
    let notice = self.update(|controller| {
      controller.finish_fetch(result)
    });
    self.announce(notice);
  }

  /// Server-side filtering with a local
  /// fallback.
  #[tracing::instrument(skip(self))]
  pub async fn filter(
    &self,
    criteria: FilterCriteria
  ) -> FilterOutcome {
    let request = self.update(|controller| {
      controller.begin_filter(criteria)
    });
    let result = self
      .client
      .fetch_json::<Vec<Record>>(&request)
      .await;
    self.update(|controller| {
      controller.finish_filter(result)
    })
  }

  pub fn search_locally(
    &self,
    criteria: FilterCriteria
  ) {
    self.update(|controller| {
      controller.search_locally(criteria)
    });
  }

  pub async fn reset(&self) {
    let request = self
      .update(ListController::reset_filters);
    let result = self
      .client
      .fetch_json::<Vec<Record>>(&request)
      .await;
    let notice = self.update(|controller| {
      controller.finish_fetch(result)
    });
    self.announce(notice);
  }

  pub fn open_create(&self) {
    let today = (self.today)();
    self.update(|controller| {
      controller.open_create(today)
    });
  }

  pub async fn open_edit(
    &self,
    id: RecordId
  ) {
    let open = self.update(|controller| {
      controller.open_edit(id)
    });
    if let EditOpen::Fetch(request) = open {
      let result = self
        .client
        .fetch_json::<Record>(&request)
        .await;
      let notice =
        self.update(|controller| {
          controller.finish_edit_fetch(result)
        });
      self.announce(notice);
    }
  }

  pub fn set_field(
    &self,
    field: FormField,
    value: String
  ) {
    self.update(|controller| {
      controller.set_field(field, value)
    });
  }

  pub fn revalidate_field(
    &self,
    field: FormField
  ) {
    let today = (self.today)();
    self.update(|controller| {
      controller.revalidate_field(field, today)
    });
  }

  pub fn close_form(&self) {
    self.update(ListController::close_form);
  }

  /// Validates, confirms a page-count
  /// mismatch when needed, and saves.
  /// `None` means nothing was sent.
  #[tracing::instrument(skip(self))]
  pub async fn submit(
    &self
  ) -> Option<SubmitOutcome> {
    let today = (self.today)();
    let mut step = self.update(|controller| {
      controller.prepare_submit(today)
    });

    if let SubmitStep::ConfirmMismatch(
      request
    ) = step
    {
      if self.feedback.confirm(request).await {
        step = self.update(
          ListController::proceed_after_mismatch
        );
      } else {
        debug!("mismatch declined; nothing sent");
        self.update(
          ListController::abandon_mismatch
        );
        return None;
      }
    }

    let (request, mode) = match step {
      | SubmitStep::Send { request, mode } => {
        (request, mode)
      }
      | SubmitStep::Rejected(notice) => {
        self.announce(Some(notice));
        return None;
      }
      | _ => return None
    };

    let result =
      self.client.send(&request).await;
    let outcome = self.update(|controller| {
      controller.finish_submit(mode, result)
    });

    match &outcome {
      | SubmitOutcome::Saved(notice) => {
        self.load().await;
        self.announce(Some(notice.clone()));
      }
      | SubmitOutcome::Failed(notice) => {
        self.announce(Some(notice.clone()));
      }
      | SubmitOutcome::FieldError(_)
      | SubmitOutcome::Abandoned => {}
    }
    Some(outcome)
  }

  /// Confirms, deletes (or restores) and
  /// reloads. Returns whether the server
  /// accepted the change.
  #[tracing::instrument(skip(self))]
  pub async fn delete(
    &self,
    id: RecordId
  ) -> bool {
    let request = self.read(
      ListController::delete_confirmation
    );
    if !self.feedback.confirm(request).await
    {
      debug!(id, "delete cancelled");
      return false;
    }

    let request = self.update(|controller| {
      controller.begin_delete(id)
    });
    let result =
      self.client.send(&request).await;
    let settled = self.update(|controller| {
      controller.finish_delete(result)
    });

    match settled {
      | Ok(notice) => {
        info!(id, "record removed");
        self.load().await;
        self.announce(Some(notice));
        true
      }
      | Err(notice) => {
        self.announce(notice);
        false
      }
    }
  }

  pub async fn show_details(
    &self,
    id: RecordId
  ) {
    let request = self.update(|controller| {
      controller.begin_details(id)
    });
    let result = self
      .client
      .fetch_json::<Record>(&request)
      .await;
    let notice = self.update(|controller| {
      controller.finish_details(result)
    });
    self.announce(notice);
  }

  pub fn close_details(&self) {
    self.update(ListController::close_details);
  }

  /// Shows the reading history of the
  /// open record, or hides it when it is
  /// already shown.
  pub async fn toggle_history(&self) {
    if self.read(|controller| {
      controller.history().is_some()
    }) {
      self.update(ListController::hide_history);
      return;
    }

    let Some(request) =
      self.read(ListController::begin_history)
    else {
      return;
    };
    let result = self
      .client
      .fetch_json::<Vec<HistoryEntryDto>>(
        &request
      )
      .await;
    let notice = self.update(|controller| {
      controller.finish_history(result)
    });
    self.announce(notice);
  }
}
