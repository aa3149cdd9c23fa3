// Network exchange handles
//
// Request/response modeling and interception decisions live in the network
// layer; the controller only relays identity-bearing handles and never
// mutates their internals.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::frames::FrameId;

/// Stable identity of one network exchange
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An in-flight or settled request, shared by identity
#[derive(Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

struct RequestInner {
    id: RequestId,
    url: String,
    method: String,
    frame_id: Option<FrameId>,
    is_navigation_request: bool,
    failure: Mutex<Option<String>>,
}

impl Request {
    pub fn new(
        id: impl Into<RequestId>,
        url: impl Into<String>,
        method: impl Into<String>,
        frame_id: Option<FrameId>,
        is_navigation_request: bool,
    ) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                id: id.into(),
                url: url.into(),
                method: method.into(),
                frame_id,
                is_navigation_request,
                failure: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.inner.id
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn method(&self) -> &str {
        &self.inner.method
    }

    pub fn frame_id(&self) -> Option<&FrameId> {
        self.inner.frame_id.as_ref()
    }

    /// True for the document request that drives a frame navigation
    pub fn is_navigation_request(&self) -> bool {
        self.inner.is_navigation_request
    }

    /// Failure text once the exchange has failed, if it has
    pub fn failure(&self) -> Option<String> {
        self.inner.failure.lock().clone()
    }

    pub fn set_failure(&self, error_text: impl Into<String>) {
        *self.inner.failure.lock() = Some(error_text.into());
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.inner.id)
            .field("method", &self.inner.method)
            .field("url", &self.inner.url)
            .finish()
    }
}

/// A settled response, shared by identity
#[derive(Clone)]
pub struct Response {
    inner: Arc<ResponseInner>,
}

struct ResponseInner {
    request_id: RequestId,
    url: String,
    status: u16,
    status_text: String,
    headers: HashMap<String, String>,
    from_cache: bool,
}

impl Response {
    pub fn new(
        request_id: impl Into<RequestId>,
        url: impl Into<String>,
        status: u16,
        status_text: impl Into<String>,
        headers: HashMap<String, String>,
        from_cache: bool,
    ) -> Self {
        Self {
            inner: Arc::new(ResponseInner {
                request_id: request_id.into(),
                url: url.into(),
                status,
                status_text: status_text.into(),
                headers,
                from_cache,
            }),
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.inner.request_id
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn status(&self) -> u16 {
        self.inner.status
    }

    pub fn status_text(&self) -> &str {
        &self.inner.status_text
    }

    /// Whether the response was successful (status 200-299)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.inner.status)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.inner.headers
    }

    pub fn from_cache(&self) -> bool {
        self.inner.from_cache
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("request_id", &self.inner.request_id)
            .field("status", &self.inner.status)
            .field("url", &self.inner.url)
            .finish()
    }
}

/// A browser cookie, in the protocol's own field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            url: None,
            domain: None,
            path: None,
            expires: None,
            http_only: None,
            secure: None,
            same_site: None,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Selector for cookie deletion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCookie {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DeleteCookie {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            domain: None,
            path: None,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
