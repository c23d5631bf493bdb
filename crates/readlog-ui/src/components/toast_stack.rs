use readlog_core::Toast;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct ToastStackProps {
  /// Toasts oldest first, each with
  /// whether it is fading out.
  pub toasts:     Vec<(Toast, bool)>,
  pub on_dismiss: Callback<u64>
}

#[function_component(ToastStack)]
pub fn toast_stack(
  props: &ToastStackProps
) -> Html {
  html! {
      <div class="toast-container" aria-live="polite">
          {
              for props.toasts.iter().map(|(toast, fading)| {
                  let id = toast.id;
                  let on_dismiss = props.on_dismiss.clone();
                  let class = classes!(
                      "toast",
                      toast.severity.css_class(),
                      fading.then_some("fade-out")
                  );
                  html! {
                      <div class={class} role="status">
                          <span class="toast-icon">{ toast.severity.icon() }</span>
                          <span class="toast-message">{ toast.message.clone() }</span>
                          <button
                              class="toast-close"
                              aria-label="Dismiss"
                              onclick={move |_| on_dismiss.emit(id)}
                          >
                              { "×" }
                          </button>
                      </div>
                  }
              })
          }
      </div>
  }
}
