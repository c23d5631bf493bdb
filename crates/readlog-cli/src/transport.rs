use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use readlog_core::ApiError;
use readlog_core::http::{Method, PreparedRequest, RawResponse, Transport};
use tracing::{debug, warn};

/// `reqwest` transport that replays the session cookie given on the command line.
pub struct ReqwestTransport {
    client: reqwest::Client,
    cookie: Option<String>,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, cookie: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed building HTTP client")?;
        Ok(Self {
            client,
            cookie: cookie.filter(|cookie| !cookie.trim().is_empty()),
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: PreparedRequest) -> Result<RawResponse, ApiError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        debug!(method = %method, url = %request.url, "sending request");

        let mut builder = self
            .client
            .request(method, request.url.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.include_credentials
            && let Some(cookie) = &self.cookie
        {
            builder = builder.header(reqwest::header::COOKIE, cookie.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                warn!(status, error = %error, "failed reading response body");
                String::new()
            }
        };

        Ok(RawResponse { status, body })
    }

    fn redirect_to_login(&self, login_path: &str) {
        let target = if login_path.contains("://") {
            login_path.to_string()
        } else {
            format!("{}{login_path}", self.base_url)
        };
        warn!(login = %target, "session expired or missing; sign in and pass --cookie");
        eprintln!("Not signed in. Sign in at {target} and pass the session cookie with --cookie.");
    }
}
