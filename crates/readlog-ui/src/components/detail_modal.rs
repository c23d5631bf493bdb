use readlog_core::Record;
use readlog_core::datetime::format_display_date;
use readlog_core::record::RecordExt;
use readlog_shared::HistoryEntryDto;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct DetailModalProps {
  pub record:            Record,
  pub show_owner:        bool,
  pub history_enabled:   bool,
  /// `None` while the history view is
  /// hidden.
  pub history:
    Option<Vec<HistoryEntryDto>>,
  pub on_toggle_history: Callback<()>,
  pub on_close:          Callback<()>
}

fn row(label: &str, value: String) -> Html {
  html! {
      <div class="kv">
          <strong>{ label.to_string() }</strong>
          <div>{ value }</div>
      </div>
  }
}

fn optional_pages(
  value: Option<u32>
) -> String {
  value.map_or_else(
    || "—".to_string(),
    |pages| pages.to_string()
  )
}

fn history_entry(
  entry: &HistoryEntryDto
) -> Html {
  let class = classes!(
    "history-entry",
    entry.is_current.then_some("current")
  );
  let day = entry
    .date
    .map(format_display_date)
    .unwrap_or_else(|| "—".to_string());
  let pages = match (
    entry.current_page,
    entry.total_pages
  ) {
    | (Some(current), Some(total)) => {
      format!("{current} / {total} pages")
    }
    | (Some(current), None) => {
      format!("page {current}")
    }
    | _ => String::new()
  };

  html! {
      <li class={class}>
          <div class="history-head">
              <span>{ day }</span>
              {
                  match entry.time_spent {
                      | Some(minutes) => html! { <span>{ format!("{minutes} mins") }</span> },
                      | None => html! {}
                  }
              }
              {
                  if entry.is_current {
                      html! { <span class="badge">{ "Current" }</span> }
                  } else {
                      html! {}
                  }
              }
          </div>
          {
              if pages.is_empty() {
                  html! {}
              } else {
                  html! { <div class="history-pages">{ pages }</div> }
              }
          }
          {
              match entry.notes.as_deref().filter(|notes| !notes.is_empty()) {
                  | Some(notes) => html! { <div class="history-notes">{ notes.to_string() }</div> },
                  | None => html! {}
              }
          }
      </li>
  }
}

#[function_component(DetailModal)]
pub fn detail_modal(
  props: &DetailModalProps
) -> Html {
  let record = &props.record;
  let on_close = {
    let on_close = props.on_close.clone();
    Callback::from(move |_| on_close.emit(()))
  };
  let on_toggle = {
    let on_toggle =
      props.on_toggle_history.clone();
    Callback::from(move |_| on_toggle.emit(()))
  };

  html! {
      <div class="modal open" role="dialog" aria-modal="true">
          <div class="modal-backdrop" onclick={on_close.clone()}></div>
          <div class="modal-dialog panel details">
              <div class="header">
                  <span>{ record.title.clone() }</span>
                  <button class="modal-close" aria-label="Close" onclick={on_close.clone()}>{ "×" }</button>
              </div>
              { row("author", record.author.clone()) }
              {
                  if props.show_owner {
                      row("user", record.owner_label().to_string())
                  } else {
                      html! {}
                  }
              }
              { row("date", record.day().map(format_display_date).unwrap_or_else(|| "—".to_string())) }
              { row("time", format!("{} mins", record.time_spent)) }
              { row("current page", optional_pages(record.current_page)) }
              { row("total pages", optional_pages(record.total_pages)) }
              {
                  match record.progress_percent() {
                      | Some(percent) => row("progress", format!("{percent}%")),
                      | None => html! {}
                  }
              }
              {
                  match &record.reason {
                      | Some(reason) if !reason.is_empty() => row("reason", reason.clone()),
                      | _ => html! {}
                  }
              }
              <div class="details-notes">
                  { record.notes.clone().filter(|notes| !notes.is_empty()).unwrap_or_else(|| "No notes.".to_string()) }
              </div>
              {
                  match &props.history {
                      | Some(entries) if entries.is_empty() => html! {
                          <div class="empty-state">{ "No reading history for this book yet." }</div>
                      },
                      | Some(entries) => html! {
                          <ul class="history">
                              { for entries.iter().map(history_entry) }
                          </ul>
                      },
                      | None => html! {}
                  }
              }
              <div class="actions">
                  {
                      if props.history_enabled {
                          html! {
                              <button class="btn" onclick={on_toggle}>
                                  { if props.history.is_some() { "Hide History" } else { "View History" } }
                              </button>
                          }
                      } else {
                          html! {}
                      }
                  }
                  <button class="btn" onclick={on_close}>{ "Close" }</button>
              </div>
          </div>
      </div>
  }
}
