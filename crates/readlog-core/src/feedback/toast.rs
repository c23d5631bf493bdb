use serde::{
  Deserialize,
  Serialize
};

pub const DEFAULT_TOAST_MS: u64 = 3_000;
pub const TOAST_FADE_MS: u64 = 300;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Success,
  Error
}

impl Severity {
  pub fn css_class(self) -> &'static str {
    match self {
      | Self::Info => "info",
      | Self::Success => "success",
      | Self::Error => "error"
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      | Self::Info => "ℹ",
      | Self::Success => "✓",
      | Self::Error => "!"
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
  pub id:          u64,
  pub message:     String,
  pub severity:    Severity,
  pub duration_ms: u64,
  pub created_ms:  u64
}

impl Toast {
  pub fn fade_at(&self) -> u64 {
    self
      .created_ms
      .saturating_add(self.duration_ms)
  }

  pub fn remove_at(&self) -> u64 {
    self
      .fade_at()
      .saturating_add(TOAST_FADE_MS)
  }

  pub fn is_fading(
    &self,
    now_ms: u64
  ) -> bool {
    now_ms >= self.fade_at()
  }
}

/// Stacked toasts on a caller-supplied
/// millisecond clock. Nothing is
/// de-duplicated.
#[derive(Debug, Default)]
pub struct ToastQueue {
  next_id: u64,
  entries: Vec<Toast>
}

impl ToastQueue {
  pub fn push(
    &mut self,
    message: impl Into<String>,
    severity: Severity,
    duration_ms: Option<u64>,
    now_ms: u64
  ) -> u64 {
    self.next_id += 1;
    let toast = Toast {
      id: self.next_id,
      message: message.into(),
      severity,
      duration_ms: duration_ms
        .unwrap_or(DEFAULT_TOAST_MS),
      created_ms: now_ms
    };
    tracing::debug!(
      id = toast.id,
      severity = severity.css_class(),
      "toast queued"
    );
    self.entries.push(toast);
    self.next_id
  }

  /// Drops every toast whose fade has
  /// finished. Returns whether anything
  /// changed.
  pub fn tick(
    &mut self,
    now_ms: u64
  ) -> bool {
    let before = self.entries.len();
    self.entries.retain(|toast| {
      now_ms < toast.remove_at()
    });
    before != self.entries.len()
  }

  pub fn dismiss(&mut self, id: u64) {
    self
      .entries
      .retain(|toast| toast.id != id);
  }

  pub fn entries(&self) -> &[Toast] {
    &self.entries
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
