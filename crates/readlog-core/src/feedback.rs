mod confirm;
mod toast;

pub use confirm::{
  ConfirmControl,
  ConfirmRequest,
  ConfirmSlot,
  Ticket
};
pub use toast::{
  DEFAULT_TOAST_MS,
  Severity,
  TOAST_FADE_MS,
  Toast,
  ToastQueue
};
