//! Redirects and server-side views.

use std::fmt;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::routing::{PathTemplate, TemplateError};

use super::json::attribute_json;
use super::{mime, Exchange, JsonRenderer, RenderError, Renderer, RESPONSE};

/// 302 to a target template; variables come from the matched route and
/// from whatever the handler published.
#[derive(Debug, Clone)]
pub struct RedirectRenderer {
    target: PathTemplate,
}

impl RedirectRenderer {
    pub fn new(target: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            target: PathTemplate::compile(target)?,
        })
    }

    pub fn target(&self) -> &PathTemplate {
        &self.target
    }
}

impl Renderer for RedirectRenderer {
    fn render(&self, exchange: &Exchange) -> Result<Response, RenderError> {
        let path = self.target.expand(&exchange.variables)?;
        let location = format!("{}{}", exchange.base_path, path);
        Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
    }
}

/// A human-facing HTML page rendered in-process.
pub trait View: Send + Sync + fmt::Debug {
    fn render(&self, exchange: &Exchange) -> Result<String, RenderError>;
}

/// Renders a view, or JSON when the client explicitly asked for it.
#[derive(Debug, Clone)]
pub struct ForwardRenderer {
    view: Arc<dyn View>,
    json: JsonRenderer,
}

impl ForwardRenderer {
    pub fn new(view: Arc<dyn View>) -> Self {
        Self {
            view,
            json: JsonRenderer::new(RESPONSE),
        }
    }
}

impl Renderer for ForwardRenderer {
    fn render(&self, exchange: &Exchange) -> Result<Response, RenderError> {
        if exchange.accept.includes(mime::JSON) {
            return self.json.render(exchange);
        }
        let html = self.view.render(exchange)?;
        Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            html,
        )
            .into_response())
    }
}

/// Table of a session's capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilitiesView;

impl View for CapabilitiesView {
    fn render(&self, exchange: &Exchange) -> Result<String, RenderError> {
        let envelope = attribute_json(exchange, RESPONSE)?;
        let session_id = exchange.variables.get("sessionId").unwrap_or("");

        let mut rows = String::new();
        if let Some(capabilities) = envelope.get("value").and_then(Value::as_object) {
            for (name, value) in capabilities {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                rows.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td></tr>\n",
                    escape_html(name),
                    escape_html(&shown)
                ));
            }
        }

        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head><title>Session {id}</title></head>\n<body>\n\
             <h1>Session {id}</h1>\n<table>\n<tr><th>Capability</th><th>Value</th></tr>\n\
             {rows}</table>\n</body>\n</html>\n",
            id = escape_html(session_id),
        ))
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
