//! Result rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Outcome + Exchange (variables, attributes, Accept)
//!     → RouteTable::select_renderer (route exact → route wildcard → globals)
//!     → Renderer::render
//!     → axum Response (status, headers, body)
//! ```
//!
//! # Design Decisions
//! - Renderers are stateless strategies, shared via `Arc`
//! - Handlers publish named attributes; renderers read them by name
//! - The same outcome may render differently per negotiated content type

pub mod json;
pub mod jsonp;
pub mod redirect;
pub mod resource;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use axum::response::Response;
use serde_json::Value;
use thiserror::Error;

use crate::command::{Failure, Outcome};
use crate::routing::{PathVariables, TemplateError};

pub use json::{EmptyRenderer, JsonErrorRenderer, JsonRenderer};
pub use jsonp::JsonpRenderer;
pub use redirect::{CapabilitiesView, ForwardRenderer, RedirectRenderer, View};
pub use resource::{Resource, ResourceRenderer};

/// Attribute holding the success envelope (or a static resource).
pub const RESPONSE: &str = "response";
/// Attribute holding the failure snapshot.
pub const EXCEPTION: &str = "exception";
/// Attribute holding the JSONP callback name.
pub const CALLBACK: &str = "callback";

/// Media types the hub negotiates on.
pub mod mime {
    pub const JSON: &str = "application/json";
    pub const JSONP: &str = "application/jsonp";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const HTML: &str = "text/html";
}

/// Errors raised while choosing or running a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Neither the route nor the table knows how to render the outcome.
    #[error("no renderer configured for outcome '{outcome}' on {path}")]
    NoRenderer { outcome: Outcome, path: String },

    #[error("attribute '{0}' is missing")]
    MissingAttribute(String),

    #[error("attribute '{name}' is not {expected}")]
    AttributeType { name: String, expected: &'static str },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A value published by a handler or the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Json(Value),
    Text(String),
    Resource(Resource),
    Failure(Failure),
}

/// Named attributes of one request.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    values: HashMap<String, Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Attribute) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(Attribute::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn failure(&self, name: &str) -> Option<&Failure> {
        match self.values.get(name) {
            Some(Attribute::Failure(failure)) => Some(failure),
            _ => None,
        }
    }
}

/// The parsed `Accept` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accept {
    raw: Option<String>,
}

impl Accept {
    pub fn new(header: Option<&str>) -> Self {
        Self {
            raw: header.map(str::to_string),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// True when `content_type` is listed verbatim (parameters ignored).
    /// `*/*` and other ranges never count as an exact match.
    pub fn includes(&self, content_type: &str) -> bool {
        let Some(raw) = &self.raw else {
            return false;
        };
        raw.split(',')
            .map(|range| range.split(';').next().unwrap_or("").trim())
            .any(|range| range.eq_ignore_ascii_case(content_type))
    }
}

/// Per-request state handed to renderers.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    /// Path relative to the mount point.
    pub path: String,
    /// Mount point prefix, empty when mounted at `/`.
    pub base_path: String,
    pub accept: Accept,
    pub variables: PathVariables,
    pub attributes: Attributes,
}

impl Exchange {
    pub fn new(method: Method, path: impl Into<String>, accept: Accept) -> Self {
        Self {
            method,
            path: path.into(),
            base_path: String::new(),
            accept,
            variables: PathVariables::new(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_variables(mut self, variables: PathVariables) -> Self {
        self.variables = variables;
        self
    }
}

/// Turns an outcome into an HTTP response.
pub trait Renderer: Send + Sync + fmt::Debug {
    fn render(&self, exchange: &Exchange) -> Result<Response, RenderError>;
}

/// A renderer bound to a content type.
#[derive(Debug, Clone)]
pub struct RenderRule {
    content_type: Option<String>,
    exact_only: bool,
    renderer: Arc<dyn Renderer>,
}

impl RenderRule {
    /// Applies whatever the client negotiated.
    pub fn any(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            content_type: None,
            exact_only: false,
            renderer,
        }
    }

    /// Preferred when `content_type` is negotiated.
    pub fn for_type(content_type: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            exact_only: false,
            renderer,
        }
    }

    /// Used only when `content_type` is negotiated, never as a default.
    pub fn exact_only(content_type: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            exact_only: true,
            renderer,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.content_type.is_none()
    }

    pub fn is_exact_only(&self) -> bool {
        self.exact_only
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub(crate) fn matches_exactly(&self, accept: &Accept) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| accept.includes(content_type))
    }

    pub(crate) fn same_key(&self, other: &RenderRule) -> bool {
        match (&self.content_type, &other.content_type) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_exact_match() {
        let accept = Accept::new(Some("text/html, application/json;q=0.9"));
        assert!(accept.includes(mime::JSON));
        assert!(accept.includes("TEXT/HTML"));
        assert!(!accept.includes(mime::JSONP));
    }

    #[test]
    fn test_accept_wildcards_are_not_exact() {
        assert!(!Accept::new(Some("*/*")).includes(mime::JSON));
        assert!(!Accept::new(None).includes(mime::JSON));
    }

    #[test]
    fn test_attribute_accessors() {
        let mut attributes = Attributes::new();
        attributes.insert(CALLBACK, Attribute::Text("cb".into()));
        attributes.insert(RESPONSE, Attribute::Json(Value::Bool(true)));

        assert_eq!(attributes.text(CALLBACK), Some("cb"));
        assert_eq!(attributes.text(RESPONSE), None);
        assert!(attributes.failure(EXCEPTION).is_none());
        assert!(attributes.contains(RESPONSE));
    }
}
