use std::fmt;
use std::sync::OnceLock;

use readlog_shared::ErrorBody;
use regex::Regex;
use thiserror::Error;

use crate::form::FormField;

const PAGE_COUNT_MISMATCH_PREFIX: &str =
  "PAGE_COUNT_MISMATCH:";

/// A business-rule violation reported
/// by the server in a structured error
/// string.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Conflict {
  PageCountMismatch {
    existing:  u32,
    attempted: u32
  }
}

impl Conflict {
  /// Recognises
  /// `PAGE_COUNT_MISMATCH:<existing>:<attempted>`
  /// and the older sentence form of the
  /// same rule.
  pub fn parse(
    message: &str
  ) -> Option<Self> {
    let message = message.trim();
    if let Some(rest) = message
      .strip_prefix(PAGE_COUNT_MISMATCH_PREFIX)
    {
      let (existing, attempted) =
        rest.split_once(':')?;
      return Some(
        Self::PageCountMismatch {
          existing:  existing
            .trim()
            .parse()
            .ok()?,
          attempted: attempted
            .trim()
            .parse()
            .ok()?
        }
      );
    }

    let captures =
      legacy_mismatch_regex()?
        .captures(message)?;
    Some(Self::PageCountMismatch {
      existing:  captures[1].parse().ok()?,
      attempted: captures[2].parse().ok()?
    })
  }

  /// Form field the conflict is shown
  /// on.
  pub fn field(self) -> FormField {
    match self {
      | Self::PageCountMismatch {
        ..
      } => FormField::TotalPages
    }
  }
}

impl fmt::Display for Conflict {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::PageCountMismatch {
        existing,
        attempted
      } => write!(
        f,
        "This book is already recorded \
         with {existing} pages. You \
         cannot change it to \
         {attempted} pages."
      )
    }
  }
}

fn legacy_mismatch_regex()
-> Option<&'static Regex> {
  static LEGACY: OnceLock<Option<Regex>> =
    OnceLock::new();
  LEGACY
    .get_or_init(|| {
      Regex::new(
        r"recorded total of (\d+).*change it to (\d+)"
      )
      .map_err(|error| {
        tracing::error!(
          %error,
          "failed to compile page \
           mismatch pattern"
        );
      })
      .ok()
    })
    .as_ref()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
  #[error(
    "session expired; redirected to \
     login"
  )]
  Unauthorized,

  #[error("{0}")]
  Conflict(Conflict),

  #[error("not found: {message}")]
  NotFound { message: String },

  #[error(
    "server rejected request \
     ({status}): {message}"
  )]
  Server { status: u16, message: String },

  #[error("network error: {0}")]
  Transport(String),

  #[error(
    "failed to decode response: {0}"
  )]
  Decode(String),

  #[error(
    "failed to encode request: {0}"
  )]
  Encode(String)
}

impl ApiError {
  /// Normalises a non-2xx response.
  #[tracing::instrument(skip(body))]
  pub fn from_response(
    status: u16,
    body: &str
  ) -> Self {
    let parsed =
      serde_json::from_str::<ErrorBody>(
        body
      )
      .unwrap_or_default();
    let message = parsed
      .error
      .or(parsed.message)
      .filter(|text| {
        !text.trim().is_empty()
      });

    if status == 401 {
      return Self::Unauthorized;
    }

    if let Some(conflict) = message
      .as_deref()
      .and_then(Conflict::parse)
    {
      return Self::Conflict(conflict);
    }

    let message =
      message.unwrap_or_else(|| {
        status_text(status).to_string()
      });

    if status == 404 {
      Self::NotFound {
        message
      }
    } else {
      Self::Server {
        status,
        message
      }
    }
  }

  /// Best message for a generic toast.
  pub fn user_message(
    &self,
    fallback: &str
  ) -> String {
    match self {
      | Self::Server {
        message,
        ..
      }
      | Self::NotFound {
        message
      } if !message.is_empty() => {
        message.clone()
      }
      | Self::Conflict(conflict) => {
        conflict.to_string()
      }
      | Self::Unauthorized => {
        "Your session has expired"
          .to_string()
      }
      | _ => fallback.to_string()
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, Self::Unauthorized)
  }
}

fn status_text(status: u16) -> &'static str {
  match status {
    | 400 => "Bad Request",
    | 403 => "Access denied",
    | 404 => "Not Found",
    | 409 => "Conflict",
    | 413 => "Payload too large",
    | 500 => "Internal Server Error",
    | 502 | 503 | 504 => {
      "Service unavailable"
    }
    | _ => "Request failed"
  }
}
