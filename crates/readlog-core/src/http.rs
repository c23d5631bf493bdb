use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  warn
};
use url::form_urlencoded;

use crate::error::ApiError;
use crate::filter::FilterCriteria;
use crate::record::{
  Record,
  RecordDraft,
  RecordId
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete
}

impl Method {
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Get => "GET",
      | Self::Post => "POST",
      | Self::Put => "PUT",
      | Self::Delete => "DELETE"
    }
  }
}

/// A request relative to the server
/// root, before credentials and headers
/// are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
  pub method: Method,
  pub path:   String,
  pub query:  Vec<(String, String)>,
  pub body:   Option<String>
}

impl ApiRequest {
  pub fn get(
    path: impl Into<String>
  ) -> Self {
    Self {
      method: Method::Get,
      path:   path.into(),
      query:  Vec::new(),
      body:   None
    }
  }

  pub fn delete(
    path: impl Into<String>
  ) -> Self {
    Self {
      method: Method::Delete,
      ..Self::get(path)
    }
  }

  pub fn with_json<B: Serialize>(
    method: Method,
    path: impl Into<String>,
    body: &B
  ) -> Result<Self, ApiError> {
    let body = serde_json::to_string(body)
      .map_err(|error| {
        ApiError::Encode(error.to_string())
      })?;
    Ok(Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body: Some(body)
    })
  }

  pub fn with_query(
    mut self,
    pairs: impl IntoIterator<
      Item = (String, String)
    >
  ) -> Self {
    self.query.extend(pairs);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
  pub method:              Method,
  pub url:                 String,
  pub headers:             Vec<(String, String)>,
  pub body:                Option<String>,
  pub include_credentials: bool
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
  pub status: u16,
  pub body:   String
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Anti-forgery token and the header it
/// travels in, read once per page.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct CsrfToken {
  pub header: String,
  pub token:  String
}

/// Moves a prepared request over the
/// wire. Browser and native clients
/// each provide one.
#[async_trait(?Send)]
pub trait Transport {
  async fn execute(
    &self,
    request: PreparedRequest
  ) -> Result<RawResponse, ApiError>;

  /// Called once when the server
  /// answers 401.
  fn redirect_to_login(
    &self,
    login_path: &str
  );
}

pub struct ApiClient<T> {
  transport:  T,
  base_url:   String,
  login_path: String,
  csrf:       Option<CsrfToken>
}

impl<T: Transport> ApiClient<T> {
  pub fn new(
    transport: T,
    base_url: impl Into<String>,
    login_path: impl Into<String>
  ) -> Self {
    Self {
      transport,
      base_url: base_url.into(),
      login_path: login_path.into(),
      csrf: None
    }
  }

  pub fn with_csrf(
    mut self,
    csrf: Option<CsrfToken>
  ) -> Self {
    self.csrf = csrf;
    self
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  pub fn prepare(
    &self,
    request: &ApiRequest
  ) -> PreparedRequest {
    let mut url = format!(
      "{}{}",
      self.base_url.trim_end_matches('/'),
      request.path
    );
    if !request.query.is_empty() {
      let encoded =
        form_urlencoded::Serializer::new(
          String::new()
        )
        .extend_pairs(
          request.query.iter()
        )
        .finish();
      url.push('?');
      url.push_str(&encoded);
    }

    let mut headers = Vec::new();
    if let Some(csrf) = &self.csrf {
      headers.push((
        csrf.header.clone(),
        csrf.token.clone()
      ));
    }
    if request.body.is_some() {
      headers.push((
        "Content-Type".to_string(),
        "application/json".to_string()
      ));
    }

    PreparedRequest {
      method: request.method,
      url,
      headers,
      body: request.body.clone(),
      include_credentials: true
    }
  }

  /// Sends the request; 401 redirects
  /// to the login route and fails, any
  /// other non-2xx is normalised.
  #[tracing::instrument(skip_all, fields(method = request.method.as_str(), path = %request.path))]
  pub async fn send(
    &self,
    request: &ApiRequest
  ) -> Result<RawResponse, ApiError> {
    let prepared = self.prepare(request);
    debug!(url = %prepared.url, "sending request");

    let response = self
      .transport
      .execute(prepared)
      .await?;

    if response.status == 401 {
      warn!(
        login = %self.login_path,
        "session expired; redirecting"
      );
      self
        .transport
        .redirect_to_login(&self.login_path);
      return Err(ApiError::Unauthorized);
    }

    if !response.is_success() {
      let error = ApiError::from_response(
        response.status,
        &response.body
      );
      debug!(%error, "request rejected");
      return Err(error);
    }

    Ok(response)
  }

  pub async fn fetch_json<R>(
    &self,
    request: &ApiRequest
  ) -> Result<R, ApiError>
  where
    R: DeserializeOwned
  {
    let response =
      self.send(request).await?;
    serde_json::from_str(&response.body)
      .map_err(|error| {
        ApiError::Decode(error.to_string())
      })
  }
}

/// Paths of one record collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEndpoints {
  pub collection: String,
  pub filter:     String
}

impl RecordEndpoints {
  pub fn list(&self) -> ApiRequest {
    ApiRequest::get(&self.collection)
  }

  pub fn get(
    &self,
    id: RecordId
  ) -> ApiRequest {
    ApiRequest::get(self.item(id))
  }

  pub fn create(
    &self,
    draft: &RecordDraft
  ) -> Result<ApiRequest, ApiError> {
    ApiRequest::with_json(
      Method::Post,
      &self.collection,
      draft
    )
  }

  pub fn update(
    &self,
    id: RecordId,
    draft: &RecordDraft
  ) -> Result<ApiRequest, ApiError> {
    ApiRequest::with_json(
      Method::Put,
      self.item(id),
      draft
    )
  }

  pub fn delete(
    &self,
    id: RecordId
  ) -> ApiRequest {
    ApiRequest::delete(self.item(id))
  }

  pub fn filter(
    &self,
    criteria: &FilterCriteria
  ) -> ApiRequest {
    ApiRequest::get(&self.filter)
      .with_query(criteria.query_params())
  }

  pub fn history(
    &self,
    record: &Record
  ) -> ApiRequest {
    ApiRequest::get(format!(
      "{}/history",
      self.collection
    ))
    .with_query([
      (
        "title".to_string(),
        record.title.trim().to_string()
      ),
      (
        "author".to_string(),
        record.author.trim().to_string()
      ),
      (
        "currentLogId".to_string(),
        record.id.to_string()
      ),
    ])
  }

  fn item(&self, id: RecordId) -> String {
    format!("{}/{id}", self.collection)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use futures::executor::block_on;

  use super::*;

  #[derive(Default)]
  struct Canned {
    status:     u16,
    body:       String,
    sent:       RefCell<Vec<PreparedRequest>>,
    redirected: RefCell<Vec<String>>
  }

  #[async_trait(?Send)]
  impl Transport for Canned {
    async fn execute(
      &self,
      request: PreparedRequest
    ) -> Result<RawResponse, ApiError> {
      self.sent.borrow_mut().push(request);
      Ok(RawResponse {
        status: self.status,
        body:   self.body.clone()
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

  fn client(
    status: u16,
    body: &str
  ) -> ApiClient<Canned> {
    ApiClient::new(
      Canned {
        status,
        body: body.to_string(),
        ..Canned::default()
      },
      "http://localhost:8080/",
      "/auth"
    )
    .with_csrf(Some(CsrfToken {
      header: "X-CSRF-TOKEN".to_string(),
      token:  "abc".to_string()
    }))
  }

  #[test]
  fn prepare_attaches_csrf_credentials_and_query()
   {
    let client = client(200, "[]");
    let endpoints = RecordEndpoints {
      collection: "/api/reading-logs"
        .to_string(),
      filter:     "/api/reading-logs/filter"
        .to_string()
    };
    let prepared = client.prepare(
      &endpoints.filter(
        &FilterCriteria::with_query(
          "war & peace"
        )
      )
    );

    assert_eq!(
      prepared.url,
      "http://localhost:8080/api/reading-logs/filter?query=war+%26+peace"
    );
    assert!(prepared.include_credentials);
    assert_eq!(
      prepared.headers,
      vec![(
        "X-CSRF-TOKEN".to_string(),
        "abc".to_string()
      )]
    );
  }

  #[test]
  fn json_body_sets_content_type() {
    let client = client(200, "{}");
    let request = ApiRequest::with_json(
      Method::Post,
      "/api/reading-logs",
      &serde_json::json!({"title": "Dune"})
    )
    .expect("encode");
    let prepared = client.prepare(&request);
    assert!(prepared.headers.contains(&(
      "Content-Type".to_string(),
      "application/json".to_string()
    )));
  }

  #[test]
  fn unauthorized_redirects_once_and_fails() {
    let client = client(401, "");
    let result = block_on(client.send(
      &ApiRequest::get("/api/reading-logs")
    ));

    assert_eq!(
      result,
      Err(ApiError::Unauthorized)
    );
    assert_eq!(
      *client.transport().redirected.borrow(),
      vec!["/auth".to_string()]
    );
  }

  #[test]
  fn error_body_is_normalised() {
    let client = client(
      400,
      r#"{"error":"Request body cannot be null or invalid"}"#
    );
    let result = block_on(
      client.fetch_json::<Vec<Record>>(
        &ApiRequest::get("/api/reading-logs")
      )
    );
    assert_eq!(
      result,
      Err(ApiError::Server {
        status:  400,
        message: "Request body cannot be \
                  null or invalid"
          .to_string()
      })
    );
  }

  #[test]
  fn empty_success_body_is_fine_for_send() {
    let client = client(200, "");
    let response = block_on(client.send(
      &ApiRequest::delete(
        "/api/reading-logs/3"
      )
    ))
    .expect("delete succeeds");
    assert!(response.body.is_empty());
    assert_eq!(
      client.transport().sent.borrow()[0]
        .method,
      Method::Delete
    );
  }
}
