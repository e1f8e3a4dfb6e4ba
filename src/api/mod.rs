//! HTTP plumbing shared by the resource clients.
//!
//! Every call resolves to an [`ApiResponse`]; transport failures, non-2xx
//! answers and malformed bodies all come back as `success: false` with an
//! error message instead of an `Err`.

pub mod attendance;
pub mod students;

use std::fmt;

use anyhow::Context;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::ApiResponse;

pub use attendance::AttendanceApi;
pub use students::StudentsApi;

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";
const UNEXPECTED_RESPONSE: &str = "Unexpected response from server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Path segments and query pairs relative to the configured base url.
/// Values are kept raw; encoding happens when the url is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(root: &str) -> Self {
        Self {
            segments: vec![root.to_string()],
            query: Vec::new(),
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        for (index, (key, value)) in self.query.iter().enumerate() {
            let sep = if index == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub endpoint: Endpoint,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot build a url for {endpoint}")]
    InvalidUrl { endpoint: String },
    #[error("request timed out")]
    Timeout,
    #[error("could not connect to server: {0}")]
    Connect(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Http(err)
        }
    }
}

/// One HTTP exchange. Implemented by [`HttpTransport`] for real traffic.
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    fn url_for(&self, endpoint: &Endpoint) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| TransportError::InvalidUrl {
                endpoint: endpoint.to_string(),
            })?;
            segments.pop_if_empty().extend(endpoint.segments());
        }
        if !endpoint.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query_pairs());
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.endpoint)?;
        let mut builder = self.client.request(request.method.into(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(TransportError::from_reqwest)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(TransportError::from_reqwest)?;
        Ok(HttpResponse { status, body })
    }
}

/// Server envelope: `{ success, data, error, message }`.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// First non-blank of `error` then `message`.
fn pick_message(error: Option<String>, message: Option<String>) -> Option<String> {
    let non_blank = |text: &String| !text.trim().is_empty();
    error.filter(non_blank).or(message.filter(non_blank))
}

fn error_text(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    pick_message(parsed.error, parsed.message)
}

pub struct ApiClient<T = HttpTransport> {
    transport: T,
}

impl ApiClient<HttpTransport> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn students(&self) -> StudentsApi<'_, T> {
        StudentsApi::new(self)
    }

    pub fn attendance(&self) -> AttendanceApi<'_, T> {
        AttendanceApi::new(self)
    }

    pub async fn get<R: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResponse<R> {
        self.request(Method::Get, endpoint, None).await
    }

    pub async fn post<R: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> ApiResponse<R> {
        self.request_with_body(Method::Post, endpoint, body).await
    }

    pub async fn put<R: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> ApiResponse<R> {
        self.request_with_body(Method::Put, endpoint, body).await
    }

    pub async fn patch<R: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResponse<R> {
        self.request(Method::Patch, endpoint, None).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResponse<R> {
        self.request(Method::Delete, endpoint, None).await
    }

    async fn request_with_body<R: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: &B,
    ) -> ApiResponse<R> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(method, endpoint, Some(value)).await,
            Err(err) => {
                warn!(%method, %endpoint, error = %err, "failed to encode request body");
                ApiResponse::failure(UNEXPECTED_ERROR)
            }
        }
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: Option<serde_json::Value>,
    ) -> ApiResponse<R> {
        let label = endpoint.to_string();
        let request = HttpRequest {
            method,
            endpoint,
            body,
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, endpoint = %label, error = %err, "request failed");
                return ApiResponse::failure(format!("Network error: {err}"));
            }
        };
        debug!(%method, endpoint = %label, status = response.status, "response received");

        if !response.is_success() {
            let error = error_text(&response.body)
                .unwrap_or_else(|| format!("Request failed with status {}", response.status));
            warn!(%method, endpoint = %label, status = response.status, %error, "request rejected");
            return ApiResponse::failure(error);
        }

        if response.body.trim().is_empty() {
            return ApiResponse::ok(None);
        }

        match serde_json::from_str::<Envelope<R>>(&response.body) {
            Ok(envelope) if envelope.success => ApiResponse::ok(envelope.data),
            Ok(envelope) => ApiResponse::failure(
                pick_message(envelope.error, envelope.message)
                    .unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
            ),
            Err(err) => {
                warn!(%method, endpoint = %label, error = %err, "could not decode response body");
                ApiResponse::failure(UNEXPECTED_RESPONSE)
            }
        }
    }
}
