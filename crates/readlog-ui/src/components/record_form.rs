use std::collections::BTreeMap;

use gloo::timers::callback::Timeout;
use readlog_core::controller::FormState;
use readlog_core::form::{
  InputKind,
  NOTES_MAX_CHARS
};
use readlog_core::FormField;
use web_sys::{
  HtmlInputElement,
  HtmlTextAreaElement,
  InputEvent,
  SubmitEvent
};
use yew::{
  Callback,
  Html,
  Properties,
  TargetCast,
  classes,
  function_component,
  html,
  use_mut_ref
};

#[derive(Properties, PartialEq)]
pub struct RecordFormProps {
  pub form:          FormState,
  pub busy:          bool,
  pub debounce_ms:   u64,
  pub on_input:
    Callback<(FormField, String)>,
  /// Fired once typing in a field has
  /// settled.
  pub on_revalidate: Callback<FormField>,
  pub on_submit:     Callback<()>,
  pub on_cancel:     Callback<()>
}

#[function_component(RecordForm)]
pub fn record_form(
  props: &RecordFormProps
) -> Html {
  let pending = use_mut_ref(
    BTreeMap::<FormField, Timeout>::new
  );
  let delay = u32::try_from(
    props.debounce_ms
  )
  .unwrap_or(u32::MAX);

  let on_field_input = |field: FormField| {
    let pending = pending.clone();
    let on_input = props.on_input.clone();
    let on_revalidate =
      props.on_revalidate.clone();
    move |value: String| {
      on_input.emit((field, value));
      let on_revalidate =
        on_revalidate.clone();
      // replacing the entry drops and
      // cancels the earlier timer
      pending.borrow_mut().insert(
        field,
        Timeout::new(delay, move || {
          on_revalidate.emit(field)
        })
      );
    }
  };

  let on_submit = {
    let on_submit = props.on_submit.clone();
    let pending = pending.clone();
    Callback::from(move |e: SubmitEvent| {
      e.prevent_default();
      pending.borrow_mut().clear();
      on_submit.emit(());
    })
  };
  let on_cancel = {
    let on_cancel = props.on_cancel.clone();
    Callback::from(move |_| on_cancel.emit(()))
  };

  let form = &props.form;
  let field_row = |field: FormField| {
    let value = form.draft.get(field).to_string();
    let error = form.errors.get(field);
    let input_class = classes!(
      "input",
      error.is_some().then_some("invalid")
    );
    let handler = on_field_input(field);
    let control = match field.input() {
      | InputKind::TextArea => {
        let counter = format!(
          "{}/{NOTES_MAX_CHARS}",
          value.chars().count()
        );
        html! {
            <>
                <textarea
                    id={field.key()}
                    class={input_class}
                    rows="4"
                    value={value}
                    oninput={Callback::from(move |e: InputEvent| {
                        let area: HtmlTextAreaElement = e.target_unchecked_into();
                        handler(area.value());
                    })}
                />
                <div class="char-count">{ counter }</div>
            </>
        }
      }
      | kind => {
        let kind = match kind {
          | InputKind::Date => "date",
          | InputKind::Number => "number",
          | _ => "text"
        };
        html! {
            <input
                id={field.key()}
                class={input_class}
                type={kind}
                min={(kind == "number").then_some("0")}
                value={value}
                oninput={Callback::from(move |e: InputEvent| {
                    let input: HtmlInputElement = e.target_unchecked_into();
                    handler(input.value());
                })}
            />
        }
      }
    };

    html! {
        <div class="field">
            <label for={field.key()}>
                { field.label() }
                { if field.required() { " *" } else { "" } }
            </label>
            { control }
            {
                match error {
                    | Some(message) => html! { <div class="field-error">{ message.to_string() }</div> },
                    | None => html! {}
                }
            }
        </div>
    }
  };

  html! {
      <div class="modal open" role="dialog" aria-modal="true">
          <div class="modal-backdrop"></div>
          <form class="modal-dialog panel record-form" onsubmit={on_submit} novalidate={true}>
              <div class="header">{ form.heading() }</div>
              { for FormField::ALL.into_iter().map(field_row) }
              <div class="actions">
                  <button type="button" class="btn" onclick={on_cancel} disabled={props.busy}>{ "Cancel" }</button>
                  <button type="submit" class="btn primary" disabled={props.busy}>
                      { if props.busy { "Saving..." } else { form.submit_label() } }
                  </button>
              </div>
          </form>
      </div>
  }
}
