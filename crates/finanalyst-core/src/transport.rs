//! REST boundary
//!
//! The client never builds HTTP messages itself; it hands a [`RestRequest`]
//! to a [`RestTransport`] and classifies the [`RestResponse`] it gets back.

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Shared transport reference
pub type TransportRef = Arc<dyn RestTransport>;

pub const JSON: &str = "application/json";
pub const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// HTTP methods used by the REST boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request; `path` includes the query string
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Vec<u8>>,
    pub content_type: Option<&'static str>,
}

impl RestRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            content_type: None,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            ..Self::get(path)
        }
    }

    pub fn with_json(method: Method, path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body),
            content_type: Some(JSON),
        }
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Path without the query string
    pub fn resource(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

/// Inbound response; header names are lowercase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RestResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_lowercase(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can carry a REST exchange
///
/// Only failures to obtain a response are errors here; any HTTP status,
/// including 4xx and 5xx, comes back as `Ok`.
#[async_trait]
pub trait RestTransport: Send + Sync {
    async fn send(&self, request: RestRequest) -> ClientResult<RestResponse>;
}

// ==================== Hyper Transport ====================

/// HTTP/1.1 transport backed by a hyper client
pub struct HyperTransport {
    client: Client<HttpConnector>,
    base_url: String,
    timeout: Duration,
}

impl HyperTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(&self, request: RestRequest) -> ClientResult<Request<Body>> {
        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(format!("{}{}", self.base_url, request.path))
            .header(hyper::header::ACCEPT, JSON);
        if let Some(content_type) = request.content_type {
            builder = builder.header(hyper::header::CONTENT_TYPE, content_type);
        }
        builder
            .body(request.body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| ClientError::NetworkFailure {
                message: format!("invalid request: {}", e),
            })
    }
}

#[async_trait]
impl RestTransport for HyperTransport {
    async fn send(&self, request: RestRequest) -> ClientResult<RestResponse> {
        let http_request = self.build(request)?;

        let exchange = async {
            let response = self.client.request(http_request).await?;
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, hyper::Error>(RestResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ClientError::NetworkFailure {
                message: e.to_string(),
            }),
            Err(_) => Err(ClientError::NetworkFailure {
                message: format!("no response within {}s", self.timeout.as_secs()),
            }),
        }
    }
}
