use async_trait::async_trait;
use gloo::net::http::{
  Request,
  RequestBuilder
};
use readlog_core::ApiClient;
use readlog_core::config::AppConfig;
use readlog_core::http::{
  CsrfToken,
  Method,
  PreparedRequest,
  RawResponse,
  Transport
};
use readlog_core::ApiError;
use web_sys::RequestCredentials;

/// Browser `fetch` behind the core
/// transport trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
  async fn execute(
    &self,
    request: PreparedRequest
  ) -> Result<RawResponse, ApiError> {
    let mut builder = match request.method {
      | Method::Get => Request::get(&request.url),
      | Method::Post => {
        Request::post(&request.url)
      }
      | Method::Put => Request::put(&request.url),
      | Method::Delete => {
        Request::delete(&request.url)
      }
    };

    if request.include_credentials {
      builder = builder.credentials(
        RequestCredentials::Include
      );
    }
    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }

    let response = finish(builder, request.body)?
      .send()
      .await
      .map_err(|error| {
        ApiError::Transport(error.to_string())
      })?;

    let status = response.status();
    let body = response
      .text()
      .await
      .unwrap_or_default();

    Ok(RawResponse {
      status,
      body
    })
  }

  fn redirect_to_login(
    &self,
    login_path: &str
  ) {
    let redirected = web_sys::window()
      .map(|window| {
        window.location().set_href(login_path)
      });
    if !matches!(redirected, Some(Ok(()))) {
      tracing::error!(
        login = %login_path,
        "failed to redirect to login"
      );
    }
  }
}

fn finish(
  builder: RequestBuilder,
  body: Option<String>
) -> Result<Request, ApiError> {
  let built = match body {
    | Some(body) => builder.body(body),
    | None => builder.build()
  };
  built.map_err(|error| {
    ApiError::Encode(error.to_string())
  })
}

/// Reads the anti-forgery token the
/// server renders into the page head.
pub fn read_csrf_meta() -> Option<CsrfToken> {
  let document = web_sys::window()
    .and_then(|window| window.document())?;
  let content = |name: &str| {
    document
      .query_selector(&format!(
        "meta[name=\"{name}\"]"
      ))
      .ok()
      .flatten()
      .and_then(|element| {
        element.get_attribute("content")
      })
      .filter(|value| !value.is_empty())
  };

  Some(CsrfToken {
    token:  content("_csrf")?,
    header: content("_csrf_header")?
  })
}

pub fn client(
  config: &AppConfig
) -> ApiClient<FetchTransport> {
  let csrf =
    read_csrf_meta().or_else(|| {
      config.csrf.clone()
    });
  if csrf.is_none() {
    tracing::warn!(
      "no anti-forgery token on page"
    );
  }
  ApiClient::new(
    FetchTransport,
    config.base_url.clone(),
    config.login_path.clone()
  )
  .with_csrf(csrf)
}
