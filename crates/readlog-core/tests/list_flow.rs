use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::executor::block_on;
use readlog_core::config::PageConfig;
use readlog_core::controller::{
  FilterOutcome,
  SubmitOutcome
};
use readlog_core::http::{
  Method,
  PreparedRequest,
  RawResponse
};
use readlog_core::{
  ApiClient,
  ApiError,
  ConfirmRequest,
  Feedback,
  FilterCriteria,
  FormField,
  ListSession,
  Phase,
  Severity,
  Transport
};
use serde_json::json;

#[derive(Default)]
struct FakeServer {
  routes:     RefCell<
    Vec<(Method, String, VecDeque<RawResponse>)>
  >,
  sent:       RefCell<Vec<PreparedRequest>>,
  redirected: RefCell<Vec<String>>
}

impl FakeServer {
  fn on(
    self,
    method: Method,
    path: &str,
    status: u16,
    body: serde_json::Value
  ) -> Self {
    let body = if body.is_null() {
      String::new()
    } else {
      body.to_string()
    };
    let response = RawResponse {
      status,
      body
    };
    {
      let mut routes =
        self.routes.borrow_mut();
      match routes.iter_mut().find(
        |(route_method, route_path, _)| {
          *route_method == method
            && route_path == path
        }
      ) {
        | Some((_, _, queue)) => {
          queue.push_back(response)
        }
        | None => routes.push((
          method,
          path.to_string(),
          VecDeque::from([response])
        ))
      }
    }
    self
  }

  fn sent(&self) -> Vec<(Method, String)> {
    self
      .sent
      .borrow()
      .iter()
      .map(|request| {
        (request.method, request.url.clone())
      })
      .collect()
  }
}

#[async_trait(?Send)]
impl Transport for FakeServer {
  async fn execute(
    &self,
    request: PreparedRequest
  ) -> Result<RawResponse, ApiError> {
    let path = request
      .url
      .split_once('?')
      .map_or(request.url.as_str(), |(path, _)| {
        path
      })
      .to_string();
    let method = request.method;
    self.sent.borrow_mut().push(request);

    let mut routes = self.routes.borrow_mut();
    let Some((_, _, queue)) =
      routes.iter_mut().find(
        |(route_method, route_path, _)| {
          *route_method == method
            && *route_path == path
        }
      )
    else {
      return Err(ApiError::Transport(
        format!("no route for {path}")
      ));
    };

    let response = if queue.len() > 1 {
      queue.pop_front()
    } else {
      queue.front().cloned()
    };
    response.ok_or_else(|| {
      ApiError::Transport("empty route".into())
    })
  }

  fn redirect_to_login(
    &self,
    login_path: &str
  ) {
    self
      .redirected
      .borrow_mut()
      .push(login_path.to_string());
  }
}

#[derive(Default)]
struct FakeFeedback {
  answers: RefCell<VecDeque<bool>>,
  asked:   RefCell<Vec<ConfirmRequest>>,
  toasts:  RefCell<Vec<(String, Severity)>>
}

impl FakeFeedback {
  fn answering(answers: &[bool]) -> Self {
    Self {
      answers: RefCell::new(
        answers.iter().copied().collect()
      ),
      ..Self::default()
    }
  }
}

#[async_trait(?Send)]
impl Feedback for FakeFeedback {
  fn toast(
    &self,
    message: &str,
    severity: Severity
  ) {
    self
      .toasts
      .borrow_mut()
      .push((message.to_string(), severity));
  }

  async fn confirm(
    &self,
    request: ConfirmRequest
  ) -> bool {
    self.asked.borrow_mut().push(request);
    self
      .answers
      .borrow_mut()
      .pop_front()
      .unwrap_or(false)
  }
}

const LOGS: &str = "/api/reading-logs";

fn june_first() -> NaiveDate {
  NaiveDate::from_ymd_opt(2024, 6, 1)
    .expect("valid date")
}

fn existing_dune() -> serde_json::Value {
  json!([{
    "id": 1,
    "title": "Dune",
    "author": "Herbert",
    "date": "2024-01-01",
    "timeSpent": 30,
    "currentPage": 20,
    "totalPages": 200
  }])
}

fn session(
  server: FakeServer,
  feedback: FakeFeedback
) -> ListSession<FakeServer, FakeFeedback> {
  ListSession::new(
    ApiClient::new(server, "", "/auth"),
    feedback,
    PageConfig::default()
  )
  .with_clock(june_first)
}

fn fill_dune(
  session: &ListSession<
    FakeServer,
    FakeFeedback
  >,
  current: &str,
  total: &str
) {
  session.open_create();
  for (field, value) in [
    (FormField::Title, "Dune"),
    (FormField::Author, "Herbert"),
    (FormField::Date, "2024-01-01"),
    (FormField::TimeSpent, "45"),
    (FormField::CurrentPage, current),
    (FormField::TotalPages, total),
  ] {
    session.set_field(field, value.to_string());
  }
}

fn field_error(
  session: &ListSession<
    FakeServer,
    FakeFeedback
  >,
  field: FormField
) -> Option<String> {
  session.read(|controller| {
    controller
      .form()
      .and_then(|form| form.errors.get(field))
      .map(str::to_string)
  })
}

#[test]
fn page_count_mismatch_is_confirmed_before_any_request()
 {
  let server = FakeServer::default().on(
    Method::Get,
    LOGS,
    200,
    existing_dune()
  );
  let session = session(
    server,
    FakeFeedback::answering(&[false])
  );
  block_on(session.load());
  fill_dune(&session, "50", "50");

  let outcome = block_on(session.submit());

  assert_eq!(outcome, None);
  let asked = session.feedback().asked.borrow();
  assert_eq!(asked.len(), 1);
  assert!(asked[0].message.contains("200"));
  assert!(asked[0].message.contains("50"));
  assert_eq!(
    session.client().transport().sent(),
    vec![(Method::Get, LOGS.to_string())]
  );
  assert!(
    session.read(|controller| {
      controller.form().is_some()
    })
  );
}

#[test]
fn confirmed_mismatch_saves_refetches_and_toasts()
 {
  let server = FakeServer::default()
    .on(Method::Get, LOGS, 200, existing_dune())
    .on(
      Method::Post,
      LOGS,
      201,
      json!({"id": 2, "message": "created"})
    );
  let session = session(
    server,
    FakeFeedback::answering(&[true])
  );
  block_on(session.load());
  fill_dune(&session, "50", "50");

  let outcome = block_on(session.submit());

  assert!(matches!(
    outcome,
    Some(SubmitOutcome::Saved(_))
  ));
  assert_eq!(
    session.client().transport().sent(),
    vec![
      (Method::Get, LOGS.to_string()),
      (Method::Post, LOGS.to_string()),
      (Method::Get, LOGS.to_string()),
    ]
  );
  assert!(
    session.read(|controller| {
      controller.form().is_none()
    })
  );
  assert_eq!(
    *session.feedback().toasts.borrow(),
    vec![(
      "Reading log created successfully"
        .to_string(),
      Severity::Success
    )]
  );
}

#[test]
fn server_page_conflict_lands_on_total_pages_field()
 {
  let server = FakeServer::default()
    .on(Method::Get, LOGS, 200, json!([]))
    .on(
      Method::Post,
      LOGS,
      400,
      json!({"error": "PAGE_COUNT_MISMATCH:120:150"})
    );
  let session =
    session(server, FakeFeedback::default());
  block_on(session.load());
  fill_dune(&session, "10", "150");

  let outcome = block_on(session.submit());

  assert_eq!(
    outcome,
    Some(SubmitOutcome::FieldError(
      FormField::TotalPages
    ))
  );
  let message =
    field_error(&session, FormField::TotalPages)
      .expect("field error shown");
  assert!(message.contains("120"));
  assert!(message.contains("150"));
  assert_eq!(
    session.read(|controller| {
      controller.phase().clone()
    }),
    Phase::ValidationError
  );
  assert!(session.feedback().toasts.borrow().is_empty());
  assert_eq!(
    session.client().transport().sent().len(),
    2
  );
}

#[test]
fn current_page_above_total_sends_nothing() {
  let server = FakeServer::default().on(
    Method::Get,
    LOGS,
    200,
    json!([])
  );
  let session =
    session(server, FakeFeedback::default());
  block_on(session.load());
  fill_dune(&session, "51", "50");

  assert_eq!(block_on(session.submit()), None);
  assert_eq!(
    field_error(&session, FormField::CurrentPage)
      .as_deref(),
    Some("Current page cannot exceed total pages")
  );
  assert_eq!(
    session.client().transport().sent().len(),
    1
  );
}

#[test]
fn delete_only_happens_after_confirmation() {
  let server = FakeServer::default()
    .on(Method::Get, LOGS, 200, existing_dune())
    .on(
      Method::Delete,
      "/api/reading-logs/1",
      200,
      serde_json::Value::Null
    );
  let session = session(
    server,
    FakeFeedback::answering(&[false, true])
  );
  block_on(session.load());

  assert!(!block_on(session.delete(1)));
  assert_eq!(
    session.client().transport().sent().len(),
    1
  );

  assert!(block_on(session.delete(1)));
  let sent = session.client().transport().sent();
  assert_eq!(
    sent[1],
    (
      Method::Delete,
      "/api/reading-logs/1".to_string()
    )
  );
  assert_eq!(sent[2].0, Method::Get);
  assert_eq!(
    session.client().transport().sent.borrow()
      [1]
      .body,
    None
  );

  let asked = session.feedback().asked.borrow();
  assert_eq!(asked[0].title, "Delete Reading Log");
  assert!(asked[0].danger);
  assert_eq!(
    session.feedback().toasts.borrow().last(),
    Some(&(
      "Reading log deleted successfully"
        .to_string(),
      Severity::Success
    ))
  );
}

#[test]
fn failed_delete_keeps_list_and_toasts_error() {
  let server = FakeServer::default()
    .on(Method::Get, LOGS, 200, existing_dune())
    .on(
      Method::Delete,
      "/api/reading-logs/1",
      500,
      json!({"error": "Database unavailable"})
    );
  let session = session(
    server,
    FakeFeedback::answering(&[true])
  );
  block_on(session.load());

  assert!(!block_on(session.delete(1)));
  assert_eq!(
    session.read(|controller| {
      controller.visible().len()
    }),
    1
  );
  assert_eq!(
    *session.feedback().toasts.borrow(),
    vec![(
      "Database unavailable".to_string(),
      Severity::Error
    )]
  );
}

#[test]
fn expired_session_redirects_once_without_toast() {
  let server = FakeServer::default().on(
    Method::Get,
    LOGS,
    401,
    serde_json::Value::Null
  );
  let session =
    session(server, FakeFeedback::default());

  block_on(session.load());

  assert_eq!(
    *session
      .client()
      .transport()
      .redirected
      .borrow(),
    vec!["/auth".to_string()]
  );
  assert!(session.feedback().toasts.borrow().is_empty());
}

#[test]
fn filter_uses_server_then_falls_back_locally() {
  let server = FakeServer::default()
    .on(
      Method::Get,
      LOGS,
      200,
      json!([
        {"id": 1, "title": "Dune", "author": "Herbert", "date": "2024-01-01", "timeSpent": 30},
        {"id": 2, "title": "Emma", "author": "Austen", "date": "2024-01-02", "timeSpent": 10}
      ])
    )
    .on(
      Method::Get,
      "/api/reading-logs/filter",
      200,
      json!([
        {"id": 2, "title": "Emma", "author": "Austen", "date": "2024-01-02", "timeSpent": 10}
      ])
    )
    .on(
      Method::Get,
      "/api/reading-logs/filter",
      503,
      serde_json::Value::Null
    );
  let session =
    session(server, FakeFeedback::default());
  block_on(session.load());

  let remote = block_on(
    session.filter(FilterCriteria::with_query("emma"))
  );
  assert_eq!(remote, FilterOutcome::Remote);

  let local = block_on(
    session.filter(FilterCriteria::with_query("dune"))
  );
  assert_eq!(local, FilterOutcome::Local);
  assert_eq!(
    session.read(|controller| {
      controller
        .visible()
        .iter()
        .map(|record| record.id)
        .collect::<Vec<_>>()
    }),
    vec![1]
  );
  assert!(
    session
      .client()
      .transport()
      .sent()
      .last()
      .is_some_and(|(_, url)| {
        url.ends_with("filter?query=dune")
      })
  );
}
