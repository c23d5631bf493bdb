use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{
  Context,
  anyhow
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::feedback::{
  ConfirmRequest,
  DEFAULT_TOAST_MS
};
use crate::filter::SortOrder;
use crate::http::{
  CsrfToken,
  RecordEndpoints
};

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Where the edit form gets its values.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EditSource {
  /// From the collection already on
  /// screen.
  #[default]
  Loaded,
  /// Re-read from the server by id.
  Remote
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct ActionLabels {
  pub delete_confirm: ConfirmRequest,
  pub delete_button:  String,
  pub deleted:        String,
  pub delete_failed:  String,
  pub created:        String,
  pub updated:        String,
  pub save_failed:    String,
  pub load_failed:    String,
  pub details_failed: String
}

impl Default for ActionLabels {
  fn default() -> Self {
    Self {
      delete_confirm: ConfirmRequest {
        title:         "Delete Reading Log"
          .to_string(),
        message:       "Are you sure you \
                        want to delete \
                        this reading log?"
          .to_string(),
        confirm_label: "Delete".to_string(),
        danger:        true
      },
      delete_button:  "Delete".to_string(),
      deleted:        "Reading log deleted \
                       successfully"
        .to_string(),
      delete_failed:  "Failed to delete \
                       reading log"
        .to_string(),
      created:        "Reading log created \
                       successfully"
        .to_string(),
      updated:        "Reading log updated \
                       successfully"
        .to_string(),
      save_failed:    "Failed to save \
                       reading log"
        .to_string(),
      load_failed:    "Failed to load logs"
        .to_string(),
      details_failed: "Failed to load log \
                       details"
        .to_string()
    }
  }
}

/// Everything that differs between the
/// list pages.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct PageConfig {
  pub key:           String,
  pub heading:       String,
  pub collection:    String,
  pub filter:        String,
  pub history:       bool,
  pub badge:         Option<String>,
  pub edit_source:   EditSource,
  pub allow_create:  bool,
  pub show_owner:    bool,
  pub sort_options:  Vec<String>,
  pub empty_message: String,
  pub labels:        ActionLabels
}

impl Default for PageConfig {
  fn default() -> Self {
    Self {
      key:           "reading".to_string(),
      heading:       "My Reading Logs"
        .to_string(),
      collection:    "/api/reading-logs"
        .to_string(),
      filter:        "/api/reading-logs/filter"
        .to_string(),
      history:       true,
      badge:         None,
      edit_source:   EditSource::Remote,
      allow_create:  true,
      show_owner:    false,
      sort_options:  [
        "date-desc",
        "date-asc",
        "time-desc",
        "time-asc",
        "title-asc",
        "title-desc"
      ]
      .map(str::to_string)
      .to_vec(),
      empty_message: "No reading logs yet. \
                      Add your first one!"
        .to_string(),
      labels:        ActionLabels::default()
    }
  }
}

impl PageConfig {
  pub fn endpoints(
    &self
  ) -> RecordEndpoints {
    RecordEndpoints {
      collection: self.collection.clone(),
      filter:     self.filter.clone()
    }
  }

  /// Parsed sort options; unknown
  /// entries are skipped.
  pub fn sort_orders(
    &self
  ) -> Vec<SortOrder> {
    let orders: Vec<SortOrder> = self
      .sort_options
      .iter()
      .filter_map(|raw| {
        let parsed = SortOrder::parse(raw);
        if parsed.is_none() {
          warn!(page = %self.key, option = %raw, "ignoring unknown sort option");
        }
        parsed
      })
      .collect();
    if orders.is_empty() {
      vec![SortOrder::DEFAULT]
    } else {
      orders
    }
  }

  fn all_users() -> Self {
    let mut sort_options =
      Self::default().sort_options;
    sort_options.extend(
      ["user-asc", "user-desc"]
        .map(str::to_string)
    );
    Self {
      key: "all".to_string(),
      heading: "All Users' Reading Logs"
        .to_string(),
      collection: "/sorted_loglist_allusers"
        .to_string(),
      filter:
        "/sorted_loglist_allusers/filter"
          .to_string(),
      history: false,
      show_owner: true,
      sort_options,
      empty_message: "No reading logs \
                      found."
        .to_string(),
      labels: ActionLabels {
        delete_confirm: ConfirmRequest {
          confirm_label: "Delete Log"
            .to_string(),
          ..ActionLabels::default()
            .delete_confirm
        },
        ..ActionLabels::default()
      },
      ..Self::default()
    }
  }

  fn violations() -> Self {
    Self {
      key: "violations".to_string(),
      heading: "Violation Logs"
        .to_string(),
      collection: "/getviologs".to_string(),
      filter: "/getviologs/filter"
        .to_string(),
      badge: Some("Violation".to_string()),
      empty_message: "No violation logs \
                      found."
        .to_string(),
      labels: ActionLabels {
        delete_confirm: ConfirmRequest {
          title:         "Restore Reading Log"
            .to_string(),
          message:       "Are you sure you \
                          want to restore \
                          this reading log?"
            .to_string(),
          confirm_label: "Restore Log"
            .to_string(),
          danger:        false
        },
        delete_button: "Restore".to_string(),
        deleted: "Reading log restored \
                  successfully"
          .to_string(),
        delete_failed: "Failed to restore \
                        reading log"
          .to_string(),
        updated: "Violation log updated \
                  successfully"
          .to_string(),
        ..ActionLabels::default()
      },
      ..Self::all_users()
    }
  }
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(default)]
pub struct AppConfig {
  pub base_url:    String,
  pub login_path:  String,
  pub toast_ms:    u64,
  pub debounce_ms: u64,
  pub csrf:        Option<CsrfToken>,
  pub pages:       Vec<PageConfig>
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      base_url:    String::new(),
      login_path:  "/auth".to_string(),
      toast_ms:    DEFAULT_TOAST_MS,
      debounce_ms: DEFAULT_DEBOUNCE_MS,
      csrf:        None,
      pages:       vec![
        PageConfig::default(),
        PageConfig::all_users(),
        PageConfig::violations(),
      ]
    }
  }
}

impl AppConfig {
  #[tracing::instrument(skip(text))]
  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut config: Self =
      toml::from_str(text).context(
        "failed to parse readlog config"
      )?;
    config.sanitize();
    Ok(config)
  }

  #[tracing::instrument]
  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    info!(config = %path.display(), "loading config");
    Self::from_toml_str(&text).with_context(
      || format!("in {}", path.display())
    )
  }

  pub fn page(
    &self,
    key: &str
  ) -> Option<&PageConfig> {
    self
      .pages
      .iter()
      .find(|page| page.key == key)
  }

  pub fn page_keys(
    &self
  ) -> impl Iterator<Item = &str> {
    self
      .pages
      .iter()
      .map(|page| page.key.as_str())
  }

  /// Normalises paths and drops pages
  /// that cannot be served.
  pub fn sanitize(&mut self) {
    self.base_url = self
      .base_url
      .trim()
      .trim_end_matches('/')
      .to_string();

    let login = self.login_path.trim();
    self.login_path = if login.is_empty() {
      "/auth".to_string()
    } else if login.starts_with('/')
      || login.contains("://")
    {
      login.to_string()
    } else {
      format!("/{login}")
    };

    if self.toast_ms == 0 {
      self.toast_ms = DEFAULT_TOAST_MS;
    }

    let mut seen = BTreeSet::new();
    self.pages.retain_mut(|page| {
      page.key = page.key.trim().to_string();
      page.collection = page
        .collection
        .trim()
        .trim_end_matches('/')
        .to_string();
      if page.key.is_empty()
        || page.collection.is_empty()
      {
        warn!(page = %page.key, "dropping page without key or collection");
        return false;
      }
      if !seen.insert(page.key.clone()) {
        warn!(page = %page.key, "dropping duplicate page");
        return false;
      }
      if page.filter.trim().is_empty() {
        page.filter =
          format!("{}/filter", page.collection);
      }
      true
    });

    if self.pages.is_empty() {
      debug!(
        "no usable pages configured; \
         using built-in pages"
      );
      self.pages = Self::default().pages;
    }
  }

  /// Applies `key=value` overrides such
  /// as `base_url=http://host:8080` or
  /// `csrf.token=...`.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      match key.as_str() {
        | "base_url" => self.base_url = value,
        | "login_path" => {
          self.login_path = value
        }
        | "toast_ms" => {
          self.toast_ms =
            parse_ms(&key, &value)?
        }
        | "debounce_ms" => {
          self.debounce_ms =
            parse_ms(&key, &value)?
        }
        | "csrf.header" => {
          self.csrf_mut().header = value
        }
        | "csrf.token" => {
          self.csrf_mut().token = value
        }
        | _ => {
          return Err(anyhow!(
            "unknown config key: {key}"
          ));
        }
      }
    }
    self.sanitize();
    Ok(())
  }

  fn csrf_mut(&mut self) -> &mut CsrfToken {
    self.csrf.get_or_insert_with(|| {
      CsrfToken {
        header: "X-CSRF-TOKEN".to_string(),
        token:  String::new()
      }
    })
  }
}

fn parse_ms(
  key: &str,
  value: &str
) -> anyhow::Result<u64> {
  value.trim().parse().with_context(|| {
    format!(
      "{key} must be a number of \
       milliseconds, got {value:?}"
    )
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_cover_every_list_page() {
    let config = AppConfig::default();
    let keys: Vec<&str> =
      config.page_keys().collect();
    assert_eq!(
      keys,
      vec!["reading", "all", "violations"]
    );

    let violations = config
      .page("violations")
      .expect("violations page");
    assert_eq!(
      violations.labels.delete_confirm.title,
      "Restore Reading Log"
    );
    assert!(
      !violations.labels.delete_confirm.danger
    );
    assert_eq!(
      violations.badge.as_deref(),
      Some("Violation")
    );
    assert!(
      violations
        .sort_orders()
        .iter()
        .any(|order| {
          order.to_string() == "user-asc"
        })
    );
  }

  #[test]
  fn partial_toml_keeps_defaults() {
    let config = AppConfig::from_toml_str(
      r#"
base_url = "http://localhost:8080/"
login_path = "login"

[[pages]]
key = "reading"
collection = "/api/reading-logs/"
edit_source = "loaded"
sort_options = ["title-asc", "bogus"]
"#
    )
    .expect("valid config");

    assert_eq!(
      config.base_url,
      "http://localhost:8080"
    );
    assert_eq!(config.login_path, "/login");
    assert_eq!(
      config.debounce_ms,
      DEFAULT_DEBOUNCE_MS
    );

    let page =
      config.page("reading").expect("page");
    assert_eq!(
      page.collection,
      "/api/reading-logs"
    );
    assert_eq!(
      page.edit_source,
      EditSource::Loaded
    );
    assert_eq!(
      page
        .sort_orders()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>(),
      vec!["title-asc"]
    );
    assert!(config.page("violations").is_none());
  }

  #[test]
  fn duplicate_and_empty_pages_are_dropped()
   {
    let mut config = AppConfig {
      pages: vec![
        PageConfig {
          filter: String::new(),
          ..PageConfig::default()
        },
        PageConfig::default(),
        PageConfig {
          key: " ".to_string(),
          ..PageConfig::default()
        },
      ],
      ..AppConfig::default()
    };
    config.sanitize();

    assert_eq!(config.pages.len(), 1);
    assert_eq!(
      config.pages[0].filter,
      "/api/reading-logs/filter"
    );
  }

  #[test]
  fn overrides_apply_and_reject_unknown_keys()
   {
    let mut config = AppConfig::default();
    config
      .apply_overrides([
        (
          "csrf.token".to_string(),
          "abc".to_string()
        ),
        (
          "toast_ms".to_string(),
          "1500".to_string()
        ),
      ])
      .expect("known keys");
    assert_eq!(config.toast_ms, 1500);
    assert_eq!(
      config.csrf,
      Some(CsrfToken {
        header: "X-CSRF-TOKEN".to_string(),
        token:  "abc".to_string()
      })
    );

    assert!(
      config
        .apply_overrides([(
          "colour".to_string(),
          "on".to_string()
        )])
        .is_err()
    );
    assert!(
      config
        .apply_overrides([(
          "debounce_ms".to_string(),
          "soon".to_string()
        )])
        .is_err()
    );
  }
}
