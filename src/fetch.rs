use std::time::Duration;

use reqwest::{
    Client, Method, RequestBuilder,
    header::{HeaderName, HeaderValue},
};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{NetworkError, OAuthError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A single outbound call to a provider endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn post(url: Url) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(url)
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = Some(form);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Executes provider requests and decodes their JSON bodies.
///
/// Implementations report transport failures, non-2xx statuses and
/// undecodable bodies as [`NetworkError`] and must not retry.
#[allow(async_fn_in_trait)]
pub trait Fetch: Send + Sync {
    async fn fetch_json(&self, request: FetchRequest) -> Result<Value, NetworkError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, OAuthError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(NetworkError::from)?;
        Ok(Self { http })
    }

    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }
}

impl Fetch for ReqwestFetcher {
    async fn fetch_json(&self, request: FetchRequest) -> Result<Value, NetworkError> {
        let FetchRequest {
            method,
            url,
            headers,
            form,
        } = request;

        debug!(%method, url = %redacted(&url), "sending provider request");
        let mut builder = self.http.request(method, url.clone());
        builder = apply_headers(builder, &headers)?;
        if let Some(form) = &form {
            builder = builder.form(form);
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), url = %redacted(&url), "provider request failed");
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| NetworkError::InvalidResponse {
            message: err.to_string(),
            body,
        })
    }
}

/// reqwest errors carry the request URL, whose query holds credentials.
fn transport(err: reqwest::Error) -> NetworkError {
    NetworkError::Transport(err.without_url())
}

/// Drops the query so credentials and tokens never reach the logs.
fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn apply_headers(
    mut builder: RequestBuilder,
    headers: &[(String, String)],
) -> Result<RequestBuilder, NetworkError> {
    for (name, value) in headers {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| NetworkError::InvalidHeader {
                name: name.clone(),
                value: value.clone(),
            })?;
        let value = HeaderValue::from_str(value).map_err(|_| NetworkError::InvalidHeader {
            name: name.to_string(),
            value: value.clone(),
        })?;
        builder = builder.header(name, value);
    }
    Ok(builder)
}
