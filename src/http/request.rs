//! Request reading capability.
//!
//! # Responsibilities
//! - Describe what the dispatcher reads from a request
//! - Adapt a buffered axum request to that description
//!
//! # Design Decisions
//! - A trait rather than a concrete type, so the JSONP facade can stand
//!   in for a native request by overriding only what it changes
//! - Bodies are fully buffered before dispatch; commands are small JSON

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};

/// Read access to one HTTP request.
pub trait HttpRequest: Send + Sync {
    fn method(&self) -> &Method;

    /// Path without query string.
    fn path(&self) -> &str;

    /// First value of a header, if it is valid UTF-8.
    fn header(&self, name: &str) -> Option<&str>;

    /// First value of a query parameter, percent-decoded.
    fn parameter(&self, name: &str) -> Option<String>;

    fn body(&self) -> &[u8];
}

/// A native request with its body already read.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl IncomingRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self {
            method,
            path: uri.path().to_string(),
            query,
            headers,
            body,
        }
    }
}

impl HttpRequest for IncomingRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn parameter(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}
