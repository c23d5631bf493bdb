use gloo::events::EventListener;
use readlog_core::ConfirmRequest;
use readlog_core::feedback::{
  ConfirmControl,
  Ticket
};
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  classes,
  function_component,
  html,
  use_effect_with
};

#[derive(Properties, PartialEq)]
pub struct ConfirmModalProps {
  pub active:
    Option<(Ticket, ConfirmRequest)>,
  pub on_control:
    Callback<(Ticket, ConfirmControl)>
}

/// The single confirmation dialog. Only
/// the confirm button answers `true`.
#[function_component(ConfirmModal)]
pub fn confirm_modal(
  props: &ConfirmModalProps
) -> Html {
  let ticket = props
    .active
    .as_ref()
    .map(|(ticket, _)| *ticket);

  {
    let on_control = props.on_control.clone();
    use_effect_with(ticket, move |ticket| {
      let listener = ticket.map(|ticket| {
        let document = gloo::utils::document();
        EventListener::new(
          &document,
          "keydown",
          move |event| {
            let escape = event
              .dyn_ref::<KeyboardEvent>()
              .is_some_and(|key| {
                key.key() == "Escape"
              });
            if escape {
              on_control.emit((
                ticket,
                ConfirmControl::Escape
              ));
            }
          }
        )
      });
      move || drop(listener)
    });
  }

  let Some((ticket, request)) =
    props.active.clone()
  else {
    return html! {};
  };

  let control = |control: ConfirmControl| {
    let on_control = props.on_control.clone();
    Callback::from(move |_: MouseEvent| {
      on_control.emit((ticket, control))
    })
  };
  let confirm_class = classes!(
    "btn",
    if request.danger {
      "danger"
    } else {
      "primary"
    }
  );

  html! {
      <div class="modal open" role="dialog" aria-modal="true">
          <div class="modal-backdrop" onclick={control(ConfirmControl::Backdrop)}></div>
          <div class="modal-dialog panel">
              <div class="header">
                  <span>{ request.title.clone() }</span>
                  <button
                      class="modal-close"
                      aria-label="Close"
                      onclick={control(ConfirmControl::CloseIcon)}
                  >
                      { "×" }
                  </button>
              </div>
              <div class="modal-body">{ request.message.clone() }</div>
              <div class="actions">
                  <button class="btn" onclick={control(ConfirmControl::Cancel)}>{ "Cancel" }</button>
                  <button class={confirm_class} onclick={control(ConfirmControl::Confirm)}>
                      { request.confirm_label.clone() }
                  </button>
              </div>
          </div>
      </div>
  }
}
