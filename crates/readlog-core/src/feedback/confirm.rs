use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmRequest {
  pub title:         String,
  pub message:       String,
  pub confirm_label: String,
  pub danger:        bool
}

impl Default for ConfirmRequest {
  fn default() -> Self {
    Self {
      title:         "Confirm Action"
        .to_string(),
      message:       "Are you sure you want \
                      to proceed?"
        .to_string(),
      confirm_label: "Confirm".to_string(),
      danger:        false
    }
  }
}

/// Every way a confirmation modal can be
/// dismissed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ConfirmControl {
  Confirm,
  Cancel,
  CloseIcon,
  Backdrop,
  Escape
}

impl ConfirmControl {
  pub fn outcome(self) -> bool {
    matches!(self, Self::Confirm)
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub struct Ticket(u64);

struct Pending<R> {
  ticket:    Ticket,
  request:   ConfirmRequest,
  responder: R
}

/// Holds at most one outstanding
/// confirmation. The responder runs
/// exactly once; controls carrying an
/// old ticket do nothing.
pub struct ConfirmSlot<R> {
  issued:  u64,
  pending: Option<Pending<R>>
}

impl<R> Default for ConfirmSlot<R> {
  fn default() -> Self {
    Self {
      issued:  0,
      pending: None
    }
  }
}

impl<R: FnOnce(bool)> ConfirmSlot<R> {
  /// Shows `request`. A confirmation
  /// that is still pending resolves to
  /// `false` first.
  pub fn open(
    &mut self,
    request: ConfirmRequest,
    responder: R
  ) -> Ticket {
    if let Some(previous) =
      self.pending.take()
    {
      tracing::debug!(
        ticket = previous.ticket.0,
        "superseding pending confirmation"
      );
      (previous.responder)(false);
    }

    self.issued += 1;
    let ticket = Ticket(self.issued);
    self.pending = Some(Pending {
      ticket,
      request,
      responder
    });
    ticket
  }

  /// Returns `false` when `ticket` is no
  /// longer the one being shown.
  pub fn resolve(
    &mut self,
    ticket: Ticket,
    control: ConfirmControl
  ) -> bool {
    let is_current = self
      .pending
      .as_ref()
      .is_some_and(|pending| {
        pending.ticket == ticket
      });
    if !is_current {
      tracing::trace!(
        ticket = ticket.0,
        ?control,
        "ignoring stale confirmation control"
      );
      return false;
    }

    if let Some(pending) = self.pending.take()
    {
      (pending.responder)(control.outcome());
    }
    true
  }

  pub fn active(
    &self
  ) -> Option<(Ticket, &ConfirmRequest)> {
    self.pending.as_ref().map(|pending| {
      (pending.ticket, &pending.request)
    })
  }
}
