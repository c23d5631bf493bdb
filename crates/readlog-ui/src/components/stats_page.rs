use std::rc::Rc;

use readlog_core::Severity;
use readlog_core::config::AppConfig;
use readlog_core::datetime::{
  self,
  format_form_date,
  parse_form_date
};
use readlog_core::stats::{
  StatCards,
  StatsPeriod,
  StatsQuery,
  StatsRange,
  book_progress_request,
  daily_series,
  progress_bars
};
use readlog_shared::{
  BookProgressDto,
  StatisticsDto
};
use web_sys::{
  HtmlInputElement,
  HtmlSelectElement
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  UseStateHandle,
  function_component,
  html,
  use_context,
  use_effect_with,
  use_state
};

use crate::api;
use crate::app::{
  FeedbackHub,
  ui_debug
};

#[derive(Properties, PartialEq)]
pub struct StatsPageProps {
  pub config: Rc<AppConfig>
}

fn load_statistics(
  config: &AppConfig,
  query: StatsQuery,
  stats: UseStateHandle<Option<StatisticsDto>>,
  hub: Rc<FeedbackHub>
) {
  let client = api::client(config);
  wasm_bindgen_futures::spawn_local(
    async move {
      match client
        .fetch_json::<StatisticsDto>(
          &query.request()
        )
        .await
      {
        | Ok(loaded) => stats.set(Some(loaded)),
        | Err(error) => {
          tracing::warn!(%error, "failed to load statistics");
          if !error.is_unauthorized() {
            hub.show(
              &error.user_message(
                "Failed to load statistics"
              ),
              Severity::Error
            );
          }
        }
      }
    }
  );
}

#[function_component(StatsPage)]
pub fn stats_page(
  props: &StatsPageProps
) -> Html {
  let hub = use_context::<Rc<FeedbackHub>>()
    .unwrap_or_default();
  let default_range =
    StatsRange::default_for(datetime::today());
  let period = use_state(|| StatsPeriod::Total);
  let start = use_state(|| {
    format_form_date(default_range.start)
  });
  let end = use_state(|| {
    format_form_date(default_range.end)
  });
  let range_error =
    use_state(|| Option::<String>::None);
  let stats =
    use_state(|| Option::<StatisticsDto>::None);
  let progress =
    use_state(|| Option::<BookProgressDto>::None);

  {
    let config = props.config.clone();
    let stats = stats.clone();
    let progress = progress.clone();
    let hub = hub.clone();
    use_effect_with((), move |_| {
      ui_debug("stats.mount", "loading totals");
      load_statistics(
        &config,
        StatsQuery::Period(StatsPeriod::Total),
        stats,
        hub
      );
      let client = api::client(&config);
      wasm_bindgen_futures::spawn_local(
        async move {
          match client
            .fetch_json::<BookProgressDto>(
              &book_progress_request()
            )
            .await
          {
            | Ok(loaded) => {
              progress.set(Some(loaded))
            }
            | Err(error) => {
              tracing::warn!(%error, "failed to load book progress");
              progress.set(Some(
                BookProgressDto::default()
              ));
            }
          }
        }
      );
      || ()
    });
  }

  let on_period_change = {
    let period = period.clone();
    let range_error = range_error.clone();
    let stats = stats.clone();
    let config = props.config.clone();
    let hub = hub.clone();
    Callback::from(move |e: web_sys::Event| {
      let select: HtmlSelectElement =
        e.target_unchecked_into();
      let Some(selected) =
        StatsPeriod::parse(&select.value())
      else {
        tracing::warn!(
          value = %select.value(),
          "unknown statistics period"
        );
        return;
      };
      period.set(selected);
      range_error.set(None);
      if selected != StatsPeriod::Custom {
        load_statistics(
          &config,
          StatsQuery::Period(selected),
          stats.clone(),
          hub.clone()
        );
      }
    })
  };

  let bind_date =
    |handle: &UseStateHandle<String>| {
      let handle = handle.clone();
      Callback::from(
        move |e: web_sys::InputEvent| {
          let input: HtmlInputElement =
            e.target_unchecked_into();
          handle.set(input.value());
        }
      )
    };

  let on_apply_range = {
    let period = period.clone();
    let start = start.clone();
    let end = end.clone();
    let range_error = range_error.clone();
    let stats = stats.clone();
    let config = props.config.clone();
    let hub = hub.clone();
    Callback::from(move |_| {
      match StatsQuery::from_selection(
        *period,
        parse_form_date(&start),
        parse_form_date(&end)
      ) {
        | Ok(query) => {
          range_error.set(None);
          load_statistics(
            &config,
            query,
            stats.clone(),
            hub.clone()
          );
        }
        | Err(error) => {
          range_error.set(Some(error.to_string()));
          hub.show(
            &error.to_string(),
            Severity::Error
          );
        }
      }
    })
  };

  let cards = (*stats)
    .as_ref()
    .map(StatCards::from);
  let series = (*stats)
    .as_ref()
    .map(daily_series)
    .unwrap_or_default();
  let peak = series
    .iter()
    .map(|(_, minutes)| *minutes)
    .max()
    .unwrap_or(0)
    .max(1);

  html! {
      <section class="stats-page">
          <div class="page-header">
              <h1>{ "Reading Progress" }</h1>
          </div>
          <div class="panel">
              <div class="header">{ "Period" }</div>
              <div class="filter-grid">
                  <div class="field">
                      <select onchange={on_period_change}>
                          {
                              for StatsPeriod::ALL.into_iter().map(|option| html! {
                                  <option value={option.as_key()} selected={option == *period}>
                                      { option.label() }
                                  </option>
                              })
                          }
                      </select>
                  </div>
                  {
                      if *period == StatsPeriod::Custom {
                          html! {
                              <>
                                  <div class="field">
                                      <label>{ "Start" }</label>
                                      <input type="date" value={(*start).clone()} oninput={bind_date(&start)} />
                                  </div>
                                  <div class="field">
                                      <label>{ "End" }</label>
                                      <input type="date" value={(*end).clone()} oninput={bind_date(&end)} />
                                  </div>
                                  <button class="btn primary" onclick={on_apply_range}>{ "Apply" }</button>
                              </>
                          }
                      } else {
                          html! {}
                      }
                  }
              </div>
              {
                  match &*range_error {
                      | Some(message) => html! { <div class="field-error">{ message.clone() }</div> },
                      | None => html! {}
                  }
              }
          </div>

          {
              match cards {
                  | Some(cards) => html! {
                      <div class="stat-cards">
                          <div class="panel stat-card">
                              <div class="stat-label">{ "Books" }</div>
                              <div class="stat-value">{ cards.book_count }</div>
                          </div>
                          <div class="panel stat-card">
                              <div class="stat-label">{ "Total reading time" }</div>
                              <div class="stat-value">{ cards.total_minutes }</div>
                          </div>
                          <div class="panel stat-card">
                              <div class="stat-label">{ "Daily average" }</div>
                              <div class="stat-value">{ cards.daily_average }</div>
                          </div>
                      </div>
                  },
                  | None => html! { <div class="loading">{ "Loading..." }</div> }
              }
          }

          <div class="panel">
              <div class="header">{ "Minutes per day" }</div>
              {
                  if series.is_empty() {
                      html! { <div class="empty-state">{ "No reading recorded in this period." }</div> }
                  } else {
                      html! {
                          <div class="bar-chart">
                              {
                                  for series.iter().map(|(day, minutes)| {
                                      let height = (*minutes as f64 / peak as f64 * 100.0).round();
                                      html! {
                                          <div class="bar" title={format!("{day}: {minutes} mins")}>
                                              <div class="bar-fill" style={format!("height:{height}%;")}></div>
                                              <div class="bar-label">{ day.clone() }</div>
                                          </div>
                                      }
                                  })
                              }
                          </div>
                      }
                  }
              }
          </div>

          <div class="panel">
              <div class="header">{ "Book progress" }</div>
              {
                  match &*progress {
                      | None => html! { <div class="loading">{ "Loading..." }</div> },
                      | Some(progress) if progress.book_progress.is_empty() => html! {
                          <div class="empty-state">{ "No books in progress." }</div>
                      },
                      | Some(progress) => html! {
                          <div class="book-progress">
                              {
                                  for progress_bars(progress).into_iter().map(|bar| html! {
                                      <div class="progress">
                                          <div class="progress-title">{ bar.title }</div>
                                          <div class="progress-track">
                                              <div class="progress-fill" style={format!("width:{}%;", bar.width)}></div>
                                          </div>
                                          <span class="progress-label">{ bar.label }</span>
                                      </div>
                                  })
                              }
                          </div>
                      }
                  }
              }
          </div>
      </section>
  }
}
