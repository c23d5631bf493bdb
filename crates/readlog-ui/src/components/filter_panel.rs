use readlog_core::datetime::parse_form_date;
use readlog_core::{
  FilterCriteria,
  SortOrder
};
use web_sys::{
  HtmlInputElement,
  HtmlSelectElement,
  KeyboardEvent
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  UseStateHandle,
  function_component,
  html,
  use_state
};

#[derive(Properties, PartialEq)]
pub struct FilterPanelProps {
  pub sort_options: Vec<SortOrder>,
  pub busy:         bool,
  /// Quick search over the loaded
  /// records.
  pub on_search:    Callback<FilterCriteria>,
  /// Server-side filtering.
  pub on_apply:     Callback<FilterCriteria>,
  pub on_reset:     Callback<()>
}

#[derive(Clone, Default, PartialEq)]
struct FilterInputs {
  query:      String,
  start_date: String,
  end_date:   String,
  min_time:   String,
  max_time:   String,
  sort:       String
}

impl FilterInputs {
  fn criteria(&self) -> FilterCriteria {
    FilterCriteria {
      query:      self.query.trim().to_string(),
      start_date: parse_form_date(
        &self.start_date
      ),
      end_date:   parse_form_date(
        &self.end_date
      ),
      min_time:   self
        .min_time
        .trim()
        .parse()
        .ok(),
      max_time:   self
        .max_time
        .trim()
        .parse()
        .ok(),
      sort:       SortOrder::parse(&self.sort)
    }
  }
}

fn bind_input(
  inputs: &UseStateHandle<FilterInputs>,
  assign: fn(&mut FilterInputs, String)
) -> Callback<web_sys::InputEvent> {
  let inputs = inputs.clone();
  Callback::from(
    move |e: web_sys::InputEvent| {
      let input: HtmlInputElement =
        e.target_unchecked_into();
      let mut next = (*inputs).clone();
      assign(&mut next, input.value());
      inputs.set(next);
    }
  )
}

#[function_component(FilterPanel)]
pub fn filter_panel(
  props: &FilterPanelProps
) -> Html {
  let inputs = use_state(|| {
    FilterInputs {
      sort: props
        .sort_options
        .first()
        .map(ToString::to_string)
        .unwrap_or_default(),
      ..FilterInputs::default()
    }
  });

  let on_search_click = {
    let inputs = inputs.clone();
    let on_search = props.on_search.clone();
    Callback::from(move |_| {
      on_search.emit(inputs.criteria())
    })
  };
  let on_query_key = {
    let inputs = inputs.clone();
    let on_search = props.on_search.clone();
    Callback::from(move |e: KeyboardEvent| {
      if e.key() == "Enter" {
        e.prevent_default();
        on_search.emit(inputs.criteria());
      }
    })
  };
  let on_sort_change = {
    let inputs = inputs.clone();
    let on_search = props.on_search.clone();
    Callback::from(move |e: web_sys::Event| {
      if let Some(select) =
        e.target_dyn_into::<HtmlSelectElement>()
      {
        let mut next = (*inputs).clone();
        next.sort = select.value();
        on_search.emit(next.criteria());
        inputs.set(next);
      } else {
        tracing::warn!(
          "sort change event had non-select \
           target"
        );
      }
    })
  };
  let on_apply = {
    let inputs = inputs.clone();
    let on_apply = props.on_apply.clone();
    Callback::from(move |_| {
      on_apply.emit(inputs.criteria())
    })
  };
  let on_reset = {
    let inputs = inputs.clone();
    let on_reset = props.on_reset.clone();
    let default_sort = props
      .sort_options
      .first()
      .map(ToString::to_string)
      .unwrap_or_default();
    Callback::from(move |_| {
      inputs.set(FilterInputs {
        sort: default_sort.clone(),
        ..FilterInputs::default()
      });
      on_reset.emit(());
    })
  };

  html! {
      <div class="panel filters">
          <div class="header">{ "Search & Filter" }</div>
          <div class="filter-grid">
              <div class="field search">
                  <input
                      type="search"
                      placeholder="Search title, author or notes"
                      value={inputs.query.clone()}
                      oninput={bind_input(&inputs, |i, v| i.query = v)}
                      onkeydown={on_query_key}
                  />
                  <button class="btn" onclick={on_search_click} disabled={props.busy}>{ "Search" }</button>
              </div>
              <div class="field">
                  <label>{ "From" }</label>
                  <input
                      type="date"
                      value={inputs.start_date.clone()}
                      oninput={bind_input(&inputs, |i, v| i.start_date = v)}
                  />
              </div>
              <div class="field">
                  <label>{ "To" }</label>
                  <input
                      type="date"
                      value={inputs.end_date.clone()}
                      oninput={bind_input(&inputs, |i, v| i.end_date = v)}
                  />
              </div>
              <div class="field">
                  <label>{ "Min minutes" }</label>
                  <input
                      type="number"
                      min="0"
                      value={inputs.min_time.clone()}
                      oninput={bind_input(&inputs, |i, v| i.min_time = v)}
                  />
              </div>
              <div class="field">
                  <label>{ "Max minutes" }</label>
                  <input
                      type="number"
                      min="0"
                      value={inputs.max_time.clone()}
                      oninput={bind_input(&inputs, |i, v| i.max_time = v)}
                  />
              </div>
              <div class="field">
                  <label>{ "Sort by" }</label>
                  <select onchange={on_sort_change}>
                      {
                          for props.sort_options.iter().map(|order| {
                              let value = order.to_string();
                              html! {
                                  <option selected={value == inputs.sort} value={value.clone()}>
                                      { order.label() }
                                  </option>
                              }
                          })
                      }
                  </select>
              </div>
          </div>
          <div class="actions">
              <button class="btn primary" onclick={on_apply} disabled={props.busy}>{ "Apply Filters" }</button>
              <button class="btn" onclick={on_reset} disabled={props.busy}>{ "Reset" }</button>
          </div>
      </div>
  }
}
