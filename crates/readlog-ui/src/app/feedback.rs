use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use gloo::timers::callback::Timeout;
use readlog_core::feedback::{
  ConfirmControl,
  ConfirmSlot,
  TOAST_FADE_MS,
  Ticket,
  ToastQueue
};
use readlog_core::{
  ConfirmRequest,
  Feedback,
  Severity,
  Toast
};
use yew::Callback;

type Responder = Box<dyn FnOnce(bool)>;

#[derive(Default)]
struct HubState {
  toasts:  ToastQueue,
  confirm: ConfirmSlot<Responder>
}

/// The page-wide toast container and
/// confirmation modal. `on_change` asks
/// the app shell to render again.
pub struct FeedbackHub {
  state:     RefCell<HubState>,
  toast_ms:  u64,
  on_change: Callback<()>
}

impl Default for FeedbackHub {
  fn default() -> Self {
    Self::new(
      readlog_core::feedback::DEFAULT_TOAST_MS,
      Callback::noop()
    )
  }
}

impl PartialEq for FeedbackHub {
  fn eq(&self, other: &Self) -> bool {
    std::ptr::eq(self, other)
  }
}

pub fn now_ms() -> u64 {
  js_sys::Date::now().max(0.0) as u64
}

impl FeedbackHub {
  pub fn new(
    toast_ms: u64,
    on_change: Callback<()>
  ) -> Self {
    Self {
      state: RefCell::new(HubState::default()),
      toast_ms,
      on_change
    }
  }

  pub fn show(
    self: &Rc<Self>,
    message: &str,
    severity: Severity
  ) {
    let id = self.state.borrow_mut().toasts.push(
      message,
      severity,
      Some(self.toast_ms),
      now_ms()
    );
    self.on_change.emit(());

    let fade = Rc::clone(self);
    Timeout::new(
      clamp_delay(self.toast_ms),
      move || {
        fade
          .state
          .borrow_mut()
          .toasts
          .tick(now_ms());
        fade.on_change.emit(());
      }
    )
    .forget();

    let remove = Rc::clone(self);
    Timeout::new(
      clamp_delay(
        self.toast_ms + TOAST_FADE_MS
      ),
      move || remove.dismiss(id)
    )
    .forget();
  }

  pub fn dismiss(&self, id: u64) {
    self.state.borrow_mut().toasts.dismiss(id);
    self.on_change.emit(());
  }

  /// Each toast with whether it has
  /// started fading.
  pub fn toasts(&self) -> Vec<(Toast, bool)> {
    let now = now_ms();
    self
      .state
      .borrow()
      .toasts
      .entries()
      .iter()
      .map(|toast| {
        (toast.clone(), toast.is_fading(now))
      })
      .collect()
  }

  pub async fn confirm(
    &self,
    request: ConfirmRequest
  ) -> bool {
    let (sender, receiver) =
      oneshot::channel();
    let ticket =
      self.state.borrow_mut().confirm.open(
        request,
        Box::new(move |answer| {
          let _ = sender.send(answer);
        })
      );
    tracing::debug!(?ticket, "confirmation shown");
    self.on_change.emit(());

    receiver.await.unwrap_or(false)
  }

  pub fn resolve(
    &self,
    ticket: Ticket,
    control: ConfirmControl
  ) {
    let resolved = self
      .state
      .borrow_mut()
      .confirm
      .resolve(ticket, control);
    if resolved {
      self.on_change.emit(());
    }
  }

  pub fn active_confirm(
    &self
  ) -> Option<(Ticket, ConfirmRequest)> {
    self
      .state
      .borrow()
      .confirm
      .active()
      .map(|(ticket, request)| {
        (ticket, request.clone())
      })
  }
}

fn clamp_delay(ms: u64) -> u32 {
  u32::try_from(ms).unwrap_or(u32::MAX)
}

/// [`Feedback`] for list sessions running
/// in the page.
#[derive(Clone)]
pub struct UiFeedback(pub Rc<FeedbackHub>);

#[async_trait(?Send)]
impl Feedback for UiFeedback {
  fn toast(
    &self,
    message: &str,
    severity: Severity
  ) {
    self.0.show(message, severity);
  }

  async fn confirm(
    &self,
    request: ConfirmRequest
  ) -> bool {
    self.0.confirm(request).await
  }
}
