use std::future::Future;
use std::rc::Rc;

use readlog_core::config::{
  AppConfig,
  PageConfig
};
use readlog_core::controller::FilterOutcome;
use readlog_core::{
  FilterCriteria,
  FormField,
  ListSession,
  Phase
};
use readlog_shared::RecordId;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html,
  use_context,
  use_effect_with,
  use_force_update,
  use_memo
};

use super::{
  DetailModal,
  FilterPanel,
  RecordCard,
  RecordForm
};
use crate::api::{
  self,
  FetchTransport
};
use crate::app::{
  FeedbackHub,
  UiFeedback,
  ui_debug
};

type Session =
  ListSession<FetchTransport, UiFeedback>;

#[derive(Properties, PartialEq)]
pub struct ListPageProps {
  pub page:   PageConfig,
  pub config: Rc<AppConfig>
}

/// Runs `action` against the session
/// without blocking the render.
fn spawn<Fut>(
  session: &Rc<Session>,
  action: impl FnOnce(Rc<Session>) -> Fut
) where
  Fut: Future<Output = ()> + 'static
{
  wasm_bindgen_futures::spawn_local(action(
    Rc::clone(session)
  ));
}

#[function_component(ListPage)]
pub fn list_page(
  props: &ListPageProps
) -> Html {
  let hub = use_context::<Rc<FeedbackHub>>()
    .unwrap_or_default();
  let force_update = use_force_update();
  let session = {
    let page = props.page.clone();
    let config = props.config.clone();
    use_memo(props.page.key.clone(), move |_| {
      Session::new(
        api::client(&config),
        UiFeedback(hub),
        page
      )
    })
  };

  {
    let session = session.clone();
    use_effect_with(
      props.page.key.clone(),
      move |key| {
        ui_debug("list.mount", key);
        session.set_on_change(Rc::new(
          move || force_update.force_update()
        ));
        spawn(&session, |session| async move {
          session.load().await;
        });
        || ()
      }
    );
  }

  let on_search = {
    let session = session.clone();
    Callback::from(
      move |criteria: FilterCriteria| {
        session.search_locally(criteria)
      }
    )
  };
  let on_apply = {
    let session = session.clone();
    Callback::from(
      move |criteria: FilterCriteria| {
        spawn(&session, |session| async move {
          let outcome =
            session.filter(criteria).await;
          if outcome == FilterOutcome::Local {
            ui_debug(
              "list.filter",
              "server filter failed; filtered locally"
            );
          }
        });
      }
    )
  };
  let on_reset = {
    let session = session.clone();
    Callback::from(move |()| {
      spawn(&session, |session| async move {
        session.reset().await;
      });
    })
  };
  let on_create = {
    let session = session.clone();
    Callback::from(move |_| {
      session.open_create()
    })
  };
  let on_view = {
    let session = session.clone();
    Callback::from(move |id: RecordId| {
      spawn(&session, |session| async move {
        session.show_details(id).await;
      });
    })
  };
  let on_edit = {
    let session = session.clone();
    Callback::from(move |id: RecordId| {
      spawn(&session, |session| async move {
        session.open_edit(id).await;
      });
    })
  };
  let on_delete = {
    let session = session.clone();
    Callback::from(move |id: RecordId| {
      spawn(&session, |session| async move {
        session.delete(id).await;
      });
    })
  };
  let on_input = {
    let session = session.clone();
    Callback::from(
      move |(field, value): (
        FormField,
        String
      )| {
        session.set_field(field, value)
      }
    )
  };
  let on_revalidate = {
    let session = session.clone();
    Callback::from(move |field: FormField| {
      session.revalidate_field(field)
    })
  };
  let on_submit = {
    let session = session.clone();
    Callback::from(move |()| {
      spawn(&session, |session| async move {
        let outcome = session.submit().await;
        tracing::debug!(?outcome, "submit settled");
      });
    })
  };
  let on_cancel = {
    let session = session.clone();
    Callback::from(move |()| {
      session.close_form()
    })
  };
  let on_close_details = {
    let session = session.clone();
    Callback::from(move |()| {
      session.close_details()
    })
  };
  let on_toggle_history = {
    let session = session.clone();
    Callback::from(move |()| {
      spawn(&session, |session| async move {
        session.toggle_history().await;
      });
    })
  };

  let (phase, visible, form, details, history) =
    session.read(|controller| {
      (
        controller.phase().clone(),
        controller.visible().to_vec(),
        controller.form().cloned(),
        controller.details().cloned(),
        controller.history().map(<[_]>::to_vec)
      )
    });
  let page = &props.page;
  let busy = phase.is_busy();

  let body = match &phase {
    | Phase::Idle | Phase::Loading => html! {
        <div class="loading">{ "Loading..." }</div>
    },
    | Phase::Error(message) => html! {
        <div class="error-state">{ message.clone() }</div>
    },
    | _ if visible.is_empty() => html! {
        <div class="empty-state">{ page.empty_message.clone() }</div>
    },
    | _ => html! {
        <div class="log-grid">
            {
                for visible.into_iter().map(|record| html! {
                    <RecordCard
                        key={record.id}
                        record={record.clone()}
                        badge={page.badge.clone()}
                        show_owner={page.show_owner}
                        delete_label={page.labels.delete_button.clone()}
                        busy={busy}
                        on_view={on_view.clone()}
                        on_edit={on_edit.clone()}
                        on_delete={on_delete.clone()}
                    />
                })
            }
        </div>
    }
  };

  html! {
      <section class="list-page">
          <div class="page-header">
              <h1>{ page.heading.clone() }</h1>
              {
                  if page.allow_create {
                      html! { <button class="btn primary" onclick={on_create} disabled={busy}>{ "Add Reading Log" }</button> }
                  } else {
                      html! {}
                  }
              }
          </div>
          <FilterPanel
              sort_options={page.sort_orders()}
              busy={busy}
              on_search={on_search}
              on_apply={on_apply}
              on_reset={on_reset}
          />
          { body }
          {
              match form {
                  | Some(form) => html! {
                      <RecordForm
                          form={form}
                          busy={matches!(phase, Phase::Submitting)}
                          debounce_ms={props.config.debounce_ms}
                          on_input={on_input}
                          on_revalidate={on_revalidate}
                          on_submit={on_submit}
                          on_cancel={on_cancel}
                      />
                  },
                  | None => html! {}
              }
          }
          {
              match details {
                  | Some(record) => html! {
                      <DetailModal
                          record={record}
                          show_owner={page.show_owner}
                          history_enabled={page.history}
                          history={history}
                          on_toggle_history={on_toggle_history}
                          on_close={on_close_details}
                      />
                  },
                  | None => html! {}
              }
          }
      </section>
  }
}
