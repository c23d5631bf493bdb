use readlog_core::Record;
use readlog_core::datetime::format_display_date;
use readlog_core::record::RecordExt;
use readlog_shared::RecordId;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

const NOTES_PREVIEW_CHARS: usize = 100;

#[derive(Properties, PartialEq)]
pub struct RecordCardProps {
  pub record:       Record,
  pub badge:        Option<String>,
  pub show_owner:   bool,
  pub delete_label: String,
  pub busy:         bool,
  pub on_view:      Callback<RecordId>,
  pub on_edit:      Callback<RecordId>,
  pub on_delete:    Callback<RecordId>
}

#[function_component(RecordCard)]
pub fn record_card(
  props: &RecordCardProps
) -> Html {
  let record = &props.record;
  let id = record.id;
  let day = record
    .day()
    .map(format_display_date)
    .unwrap_or_else(|| "—".to_string());

  html! {
      <div class="panel log-card">
          <div class="header">
              <span class="log-title">{ record.title.clone() }</span>
              {
                  match &props.badge {
                      | Some(badge) => html! { <span class="badge">{ badge.clone() }</span> },
                      | None => html! {}
                  }
              }
          </div>
          <div class="log-author">{ format!("by {}", record.author) }</div>
          {
              if props.show_owner {
                  html! { <div class="log-owner">{ record.owner_label().to_string() }</div> }
              } else {
                  html! {}
              }
          }
          <div class="kv">
              <strong>{ "date" }</strong>
              <div>{ day }</div>
          </div>
          <div class="kv">
              <strong>{ "time" }</strong>
              <div>{ format!("{} mins", record.time_spent) }</div>
          </div>
          {
              match (record.progress_percent(), record.total_pages) {
                  | (Some(percent), Some(total)) => html! {
                      <div class="progress">
                          <div class="progress-track">
                              <div class="progress-fill" style={format!("width:{}%;", percent.min(100))}></div>
                          </div>
                          <span class="progress-label">
                              { format!("{} / {total} pages ({percent}%)", record.current_page.unwrap_or(0)) }
                          </span>
                      </div>
                  },
                  | _ => html! {}
              }
          }
          {
              match &record.reason {
                  | Some(reason) if !reason.is_empty() => html! {
                      <div class="log-reason">{ reason.clone() }</div>
                  },
                  | _ => html! {}
              }
          }
          {
              match record.notes_preview(NOTES_PREVIEW_CHARS) {
                  | Some(preview) => html! { <div class="log-notes">{ preview }</div> },
                  | None => html! {}
              }
          }
          <div class="actions">
              <button class="btn" onclick={{
                  let on_view = props.on_view.clone();
                  Callback::from(move |_| on_view.emit(id))
              }}>{ "View" }</button>
              <button class="btn" disabled={props.busy} onclick={{
                  let on_edit = props.on_edit.clone();
                  Callback::from(move |_| on_edit.emit(id))
              }}>{ "Edit" }</button>
              <button class="btn danger" disabled={props.busy} onclick={{
                  let on_delete = props.on_delete.clone();
                  Callback::from(move |_| on_delete.emit(id))
              }}>{ props.delete_label.clone() }</button>
          </div>
      </div>
  }
}
