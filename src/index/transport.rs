//! HTTP transport to the index service.
//!
//! The pipeline talks to the service through [`IndexTransport`], so the
//! bootstrap and upload logic can be exercised against an in-memory fake.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{IndexerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Head,
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request against the index API, addressed by path segments.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn head(segments: Vec<String>) -> Self {
        Self {
            method: Method::Head,
            segments,
            body: None,
        }
    }

    pub fn get(segments: Vec<String>) -> Self {
        Self {
            method: Method::Get,
            segments,
            body: None,
        }
    }

    pub fn post(segments: Vec<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            segments,
            body: Some(body),
        }
    }

    /// Slash-joined path, e.g. `/api/index/mailsIndex`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Status and body of an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `HEAD /api/index/{index}`
pub fn index_segments(index: &str) -> Vec<String> {
    vec!["api".into(), "index".into(), index.into()]
}

/// `POST /api/index`
pub fn create_index_segments() -> Vec<String> {
    vec!["api".into(), "index".into()]
}

/// `GET /api/{index}/_doc/{id}`
pub fn document_segments(index: &str, id: &str) -> Vec<String> {
    vec!["api".into(), index.into(), "_doc".into(), id.into()]
}

/// `POST /api/{index}/_doc`
pub fn create_document_segments(index: &str) -> Vec<String> {
    vec!["api".into(), index.into(), "_doc".into()]
}

/// Sends requests to the index service.
///
/// Transport-level failures (connection refused, timeouts) are errors;
/// any HTTP status, including 4xx/5xx, is a successful [`ApiResponse`].
pub trait IndexTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Blocking `reqwest` client with static Basic credentials.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base: Url,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(server: &ServerConfig) -> Result<Self> {
        let base = Url::parse(&server.url)
            .map_err(|e| IndexerError::Config(format!("server.url '{}': {e}", server.url)))?;
        if base.cannot_be_a_base() {
            return Err(IndexerError::Config(format!(
                "server.url '{}' cannot be used as a base URL",
                server.url
            )));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs))
            .build()
            .map_err(|e| IndexerError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base,
            username: server.username.clone(),
            password: server.password.clone(),
        })
    }

    /// Absolute URL for a request; segments are percent-encoded.
    pub fn url(&self, request: &ApiRequest) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&request.segments);
        }
        url
    }
}

impl IndexTransport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url(request);
        let method = match request.method {
            Method::Head => reqwest::Method::HEAD,
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, url.clone())
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let transport_err = |e: reqwest::Error| IndexerError::Transport {
            method: request.method.to_string(),
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = builder.send().map_err(transport_err)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(transport_err)?;

        debug!(method = %request.method, url = %url, status, "Index API call");
        Ok(ApiResponse { status, body })
    }
}
