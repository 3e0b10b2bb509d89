//! JSONP method tunneling.
//!
//! `GET /jsonp?method=POST&path=/session/abc/url&callback=cb&body={...}`
//! is presented to the dispatcher as `POST /session/abc/url` with that
//! body and `Accept: application/jsonp`.

use axum::http::Method;
use thiserror::Error;

use crate::render::mime;

use super::request::HttpRequest;

/// Marker path of the tunnel, compared case-insensitively.
pub const JSONP_PATH: &str = "/jsonp";

/// A tunnel request that cannot be dispatched. Always a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TunnelError {
    #[error("JSONP request is missing the '{0}' parameter")]
    MissingParameter(&'static str),

    #[error("JSONP request names unknown method '{0}'")]
    UnknownMethod(String),

    #[error("JSONP callback '{0}' is not a valid identifier")]
    InvalidCallback(String),
}

/// True when `path` (relative to the mount point) is the tunnel.
pub fn is_tunnel(path: &str) -> bool {
    path.eq_ignore_ascii_case(JSONP_PATH)
}

/// A callback is a dotted script identifier such as `jQuery.cb_1`.
fn is_callback_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

/// A tunneled request seen through its underlying GET.
pub struct JsonpRequest<'a> {
    inner: &'a dyn HttpRequest,
    method: Method,
    path: String,
    body: Vec<u8>,
    callback: String,
}

impl<'a> JsonpRequest<'a> {
    /// Read the tunnel parameters from `inner`. `known` lists the methods
    /// that may be tunneled.
    pub fn tunnel(inner: &'a dyn HttpRequest, known: &[Method]) -> Result<Self, TunnelError> {
        let required = |name: &'static str| {
            inner
                .parameter(name)
                .filter(|value| !value.is_empty())
                .ok_or(TunnelError::MissingParameter(name))
        };

        let method_name = required("method")?.to_ascii_uppercase();
        let path = required("path")?;
        let callback = required("callback")?;
        if !is_callback_name(&callback) {
            return Err(TunnelError::InvalidCallback(callback));
        }

        let method = known
            .iter()
            .find(|m| m.as_str() == method_name)
            .cloned()
            .ok_or(TunnelError::UnknownMethod(method_name))?;

        // The tunneled path replaces the marker segment, so a mount
        // prefix in front of it survives.
        let outer = inner.path();
        let prefix = outer
            .len()
            .checked_sub(JSONP_PATH.len())
            .filter(|&cut| outer.is_char_boundary(cut) && is_tunnel(&outer[cut..]))
            .map_or("", |cut| &outer[..cut]);
        let path = if path.starts_with('/') {
            format!("{prefix}{path}")
        } else {
            format!("{prefix}/{path}")
        };

        Ok(Self {
            inner,
            method,
            path,
            body: inner.parameter("body").unwrap_or_default().into_bytes(),
            callback,
        })
    }

    /// Name of the function the response is wrapped in.
    pub fn callback(&self) -> &str {
        &self.callback
    }
}

impl HttpRequest for JsonpRequest<'_> {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("accept") {
            Some(mime::JSONP)
        } else {
            self.inner.header(name)
        }
    }

    fn parameter(&self, name: &str) -> Option<String> {
        self.inner.parameter(name)
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::IncomingRequest;
    use axum::body::Bytes;
    use axum::http::{header, HeaderMap, Uri};

    const KNOWN: [Method; 3] = [Method::DELETE, Method::GET, Method::POST];

    fn incoming(uri: &str) -> IncomingRequest {
        let uri: Uri = uri.parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "text/html".parse().unwrap());
        headers.insert(header::ORIGIN, "http://page.example".parse().unwrap());
        IncomingRequest::new(Method::GET, &uri, headers, Bytes::new())
    }

    #[test]
    fn test_overrides_method_path_body_and_accept() {
        let inner = incoming(
            "/wd/hub/JSONP?method=post&path=/session/abc/url&callback=cb&body=%7B%22url%22%3A%22http%3A%2F%2Fx%22%7D",
        );
        let request = JsonpRequest::tunnel(&inner, &KNOWN).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "/wd/hub/session/abc/url");
        assert_eq!(request.body(), br#"{"url":"http://x"}"#);
        assert_eq!(request.callback(), "cb");
        assert_eq!(request.header("Accept"), Some(mime::JSONP));
        assert_eq!(request.header("origin"), Some("http://page.example"));
    }

    #[test]
    fn test_body_defaults_to_empty() {
        let inner = incoming("/jsonp?method=GET&path=/status&callback=cb");
        let request = JsonpRequest::tunnel(&inner, &KNOWN).unwrap();
        assert!(request.body().is_empty());
        assert_eq!(request.path(), "/status");
    }

    #[test]
    fn test_rejects_incomplete_tunnels() {
        for (uri, missing) in [
            ("/jsonp?path=/status&callback=cb", "method"),
            ("/jsonp?method=GET&callback=cb", "path"),
            ("/jsonp?method=GET&path=/status", "callback"),
            ("/jsonp?method=GET&path=/status&callback=", "callback"),
        ] {
            let inner = incoming(uri);
            assert_eq!(
                JsonpRequest::tunnel(&inner, &KNOWN).err(),
                Some(TunnelError::MissingParameter(missing))
            );
        }
    }

    #[test]
    fn test_rejects_unknown_method() {
        let inner = incoming("/jsonp?method=patch&path=/status&callback=cb");
        assert_eq!(
            JsonpRequest::tunnel(&inner, &KNOWN).err(),
            Some(TunnelError::UnknownMethod("PATCH".into()))
        );
    }

    #[test]
    fn test_callback_must_be_an_identifier() {
        for name in ["cb", "jQuery.cb_1", "$jsonp", "_x9"] {
            assert!(is_callback_name(name), "{name}");
        }
        for name in ["1cb", "alert(1);x", "cb x", ".cb", "cb\u{e9}", "a-b"] {
            assert!(!is_callback_name(name), "{name}");
        }

        let inner = incoming("/jsonp?method=GET&path=/status&callback=alert(1)%3Bx");
        assert_eq!(
            JsonpRequest::tunnel(&inner, &KNOWN).err(),
            Some(TunnelError::InvalidCallback("alert(1);x".into()))
        );
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        assert!(is_tunnel("/jsonp"));
        assert!(is_tunnel("/JsonP"));
        assert!(!is_tunnel("/jsonp/extra"));
    }
}
