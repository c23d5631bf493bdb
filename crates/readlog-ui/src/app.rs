use std::rc::Rc;

use gloo::console::log;
use readlog_core::config::AppConfig;
use yew::{
  Callback,
  ContextProvider,
  Html,
  function_component,
  html,
  use_effect_with,
  use_force_update,
  use_memo
};
use yew_router::prelude::{
  BrowserRouter,
  Link,
  Redirect,
  Routable,
  Switch
};

use crate::components::{
  ConfirmModal,
  ListPage,
  StatsPage,
  ToastStack
};

mod feedback;

pub use feedback::{
  FeedbackHub,
  UiFeedback
};

const APP_CONFIG_TOML: &str =
  include_str!("../assets/readlog.toml");

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
  #[at("/")]
  Home,
  #[at("/logs/:key")]
  Logs { key: String },
  #[at("/progress")]
  Progress,
  #[not_found]
  #[at("/404")]
  NotFound
}

fn load_app_config() -> AppConfig {
  match AppConfig::from_toml_str(
    APP_CONFIG_TOML
  ) {
    | Ok(config) => config,
    | Err(error) => {
      tracing::error!(
        error = %format!("{error:#}"),
        "bundled config invalid; using defaults"
      );
      AppConfig::default()
    }
  }
}

#[function_component(App)]
pub fn app() -> Html {
  let config = use_memo((), |_| {
    load_app_config()
  });
  let force_update = use_force_update();
  let hub = {
    let toast_ms = config.toast_ms;
    use_memo((), move |_| {
      FeedbackHub::new(
        toast_ms,
        Callback::from(move |_| {
          force_update.force_update()
        })
      )
    })
  };

  {
    let pages = config.pages.len();
    use_effect_with((), move |_| {
      ui_debug(
        "app.mounted",
        &format!("{pages} list page(s) configured")
      );
      || ()
    });
  }

  let on_dismiss = {
    let hub = hub.clone();
    Callback::from(move |id: u64| {
      hub.dismiss(id)
    })
  };
  let on_confirm_control = {
    let hub = hub.clone();
    Callback::from(move |(ticket, control)| {
      hub.resolve(ticket, control)
    })
  };

  let render = {
    let config = config.clone();
    move |route: Route| {
      switch(route, &config)
    }
  };

  html! {
      <ContextProvider<Rc<FeedbackHub>> context={hub.clone()}>
          <BrowserRouter>
              <nav class="topbar">
                  <span class="brand">{ "Daily Reading Tracker" }</span>
                  {
                      for config.pages.iter().map(|page| html! {
                          <Link<Route> classes="nav-item" to={Route::Logs { key: page.key.clone() }}>
                              { page.heading.clone() }
                          </Link<Route>>
                      })
                  }
                  <Link<Route> classes="nav-item" to={Route::Progress}>{ "Progress" }</Link<Route>>
              </nav>
              <main class="content">
                  <Switch<Route> render={render} />
              </main>
          </BrowserRouter>
          <ToastStack toasts={hub.toasts()} on_dismiss={on_dismiss} />
          <ConfirmModal active={hub.active_confirm()} on_control={on_confirm_control} />
      </ContextProvider<Rc<FeedbackHub>>>
  }
}

fn switch(
  route: Route,
  config: &Rc<AppConfig>
) -> Html {
  match route {
    | Route::Home => {
      match config.pages.first() {
        | Some(page) => html! {
            <Redirect<Route> to={Route::Logs { key: page.key.clone() }} />
        },
        | None => html! {
            <Redirect<Route> to={Route::Progress} />
        }
      }
    }
    | Route::Logs {
      key
    } => match config.page(&key) {
      | Some(page) => html! {
          <ListPage
              key={key.clone()}
              page={page.clone()}
              config={config.clone()}
          />
      },
      | None => not_found()
    },
    | Route::Progress => html! {
        <StatsPage config={config.clone()} />
    },
    | Route::NotFound => not_found()
  }
}

fn not_found() -> Html {
  html! {
      <div class="empty-state">{ "Page not found." }</div>
  }
}

pub fn ui_debug(
  event: &str,
  detail: &str
) {
  tracing::debug!(
    event, detail, "ui-debug"
  );
  log!(format!(
    "[ui-debug] {event}: {detail}"
  ));
}
