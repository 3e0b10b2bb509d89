//! Request dispatch.
//!
//! # Responsibilities
//! - Detect and unwrap JSONP tunnels
//! - Pick the route table by method and resolve the path
//! - Build the handler, bind its session and run it exactly once
//! - Turn every result, fault or panic into a rendered response
//! - Apply cross-origin and cache headers
//!
//! # Design Decisions
//! - Nothing escapes as an unhandled error; misconfiguration is a 500
//! - Driver-scoped commands hold the session's driver lock for their
//!   whole execution, so commands against one session never overlap
//! - Handlers may publish their own `response` attribute (static files);
//!   otherwise the dispatcher stores the success envelope there

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use serde_json::{Map, Value};

use crate::command::{
    CommandContext, CommandError, CommandResponse, Handler, HandlerFactory, Invocation, Outcome,
    Scope, Services,
};
use crate::observability::metrics;
use crate::render::{Accept, Attribute, Attributes, Exchange, CALLBACK, EXCEPTION, RESPONSE};
use crate::routing::{PathVariables, RouteTables};
use crate::session::Session;

use super::jsonp::{is_tunnel, JsonpRequest};
use super::request::HttpRequest;

/// Methods answered by the hub, as listed in `Allow`.
pub const ALLOWED_METHODS: &str = "DELETE,GET,HEAD,POST";
const ALLOWED_HEADERS: &str = "Accept,Content-Type";
const EXPIRES_EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Routes requests to commands and renders their outcomes.
#[derive(Debug)]
pub struct Dispatcher {
    tables: RouteTables,
    services: Services,
    base_path: String,
}

impl Dispatcher {
    pub fn new(tables: RouteTables, services: Services, base_path: impl Into<String>) -> Self {
        Self {
            tables,
            services,
            base_path: base_path.into(),
        }
    }

    pub fn tables(&self) -> &RouteTables {
        &self.tables
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Handle one request. Always produces a response.
    pub async fn handle(&self, request: &dyn HttpRequest) -> Response {
        let start = Instant::now();
        let method = request.method().clone();

        let (mut response, label) = match method {
            Method::OPTIONS => (
                (StatusCode::OK, [(header::ALLOW, ALLOWED_METHODS)]).into_response(),
                "options",
            ),
            Method::HEAD => {
                let (response, label) = self.dispatch(request, Method::GET).await;
                let (parts, _) = response.into_parts();
                (Response::from_parts(parts, Body::empty()), label)
            }
            _ => self.dispatch(request, method.clone()).await,
        };

        if method == Method::GET || method == Method::HEAD {
            let headers = response.headers_mut();
            headers.insert(header::EXPIRES, HeaderValue::from_static(EXPIRES_EPOCH));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }
        if request.header("origin").is_some() {
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
        }

        metrics::record_command(method.as_str(), label, start);
        response
    }

    /// Strip the mount point. `None` when the path lies outside it.
    fn relative<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.base_path.is_empty() {
            return Some(path);
        }
        match path.strip_prefix(self.base_path.as_str())? {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    async fn dispatch(&self, request: &dyn HttpRequest, method: Method) -> (Response, &'static str) {
        let relative = self.relative(request.path());
        if method == Method::GET && relative.is_some_and(is_tunnel) {
            let tunneled = match JsonpRequest::tunnel(request, &RouteTables::methods()) {
                Ok(tunneled) => tunneled,
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected JSONP tunnel");
                    return ((StatusCode::BAD_REQUEST, e.to_string()).into_response(), "bad_request");
                }
            };
            let method = tunneled.method().clone();
            let callback = tunneled.callback().to_string();
            return self.route(&tunneled, method, Some(callback)).await;
        }
        self.route(request, method, None).await
    }

    async fn route(
        &self,
        request: &dyn HttpRequest,
        method: Method,
        callback: Option<String>,
    ) -> (Response, &'static str) {
        let Some(table) = self.tables.for_method(&method) else {
            return (
                (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, ALLOWED_METHODS)]).into_response(),
                "method_not_allowed",
            );
        };

        let path = request.path();
        let resolved = self
            .relative(path)
            .and_then(|relative| table.resolve(relative).map(|found| (relative, found)));
        let Some((relative, (route, variables))) = resolved else {
            tracing::debug!(method = %method, path = %path, "No route matched");
            return (
                (StatusCode::NOT_FOUND, format!("Unknown command: {method} {path}")).into_response(),
                "not_found",
            );
        };

        let mut exchange = Exchange::new(method.clone(), relative, Accept::new(request.header("accept")))
            .with_base_path(self.base_path.clone())
            .with_variables(variables);
        if let Some(callback) = callback {
            exchange.attributes.insert(CALLBACK, Attribute::Text(callback));
        }

        tracing::debug!(
            method = %method,
            path = %relative,
            handler = route.factory().name(),
            "Dispatching command"
        );
        let result = self
            .execute(
                route.factory(),
                &mut exchange.variables,
                &mut exchange.attributes,
                request.body(),
            )
            .await;

        let session_id = exchange.variables.get("sessionId").map(str::to_string);
        let outcome = match result {
            Ok(value) => {
                if !exchange.attributes.contains(RESPONSE) {
                    let envelope = CommandResponse::success(session_id, value).to_value();
                    exchange.attributes.insert(RESPONSE, Attribute::Json(envelope));
                }
                Outcome::Success
            }
            Err(err) => {
                let outcome = err.outcome();
                if outcome == Outcome::Exception {
                    tracing::warn!(
                        handler = route.factory().name(),
                        session_id = session_id.as_deref().unwrap_or("-"),
                        error = %err,
                        "Command failed"
                    );
                } else {
                    tracing::debug!(
                        handler = route.factory().name(),
                        session_id = session_id.as_deref().unwrap_or("-"),
                        error = %err,
                        "Command rejected"
                    );
                }
                exchange
                    .attributes
                    .insert(EXCEPTION, Attribute::Failure(err.to_failure()));
                outcome
            }
        };

        let rendered = table
            .select_renderer(route, outcome, &exchange.accept)
            .and_then(|renderer| renderer.render(&exchange));
        match rendered {
            Ok(response) => (response, outcome.as_str()),
            Err(e) => {
                tracing::error!(
                    method = %method,
                    path = %relative,
                    outcome = %outcome,
                    error = %e,
                    "Failed to render response"
                );
                (
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
                    "render_error",
                )
            }
        }
    }

    /// Build the handler, bind what its scope needs and run it.
    async fn execute(
        &self,
        factory: &HandlerFactory,
        variables: &mut PathVariables,
        attributes: &mut Attributes,
        body: &[u8],
    ) -> Result<Value, CommandError> {
        let params = decode_params(body)?;
        let mut handler = factory.build(&Invocation::new(variables, &params))?;

        match factory.scope() {
            Scope::Server => {
                let mut cx = CommandContext::new(&self.services, variables, attributes);
                run_guarded(handler.as_mut(), &mut cx).await
            }
            Scope::Session => {
                let session = self.bind_session(variables)?;
                let mut cx =
                    CommandContext::new(&self.services, variables, attributes).with_session(&session);
                run_guarded(handler.as_mut(), &mut cx).await
            }
            Scope::Driver => {
                let session = self.bind_session(variables)?;
                let mut slot = session.lock_driver().await;
                // Empty once the session was released while we waited.
                let driver = slot
                    .as_deref_mut()
                    .ok_or_else(|| CommandError::NoSuchSession(session.id().to_string()))?;
                let mut cx = CommandContext::new(&self.services, variables, attributes)
                    .with_session(&session)
                    .with_driver(driver);
                let result = run_guarded(handler.as_mut(), &mut cx).await;
                session.touch();
                result
            }
        }
    }

    fn bind_session(&self, variables: &PathVariables) -> Result<Arc<Session>, CommandError> {
        let id = variables
            .get("sessionId")
            .ok_or_else(|| CommandError::InvalidArgument("missing path variable 'sessionId'".into()))?;
        Ok(self.services.registry.get_and_touch(id)?)
    }
}

/// JSON object parameters. An empty body (or `null`) means none; any
/// other body must be a well-formed JSON object.
fn decode_params(body: &[u8]) -> Result<Map<String, Value>, CommandError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(CommandError::InvalidArgument(format!(
            "request body must be a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected malformed request body");
            Err(CommandError::InvalidArgument(format!("malformed JSON body: {e}")))
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

async fn run_guarded(
    handler: &mut dyn Handler,
    cx: &mut CommandContext<'_>,
) -> Result<Value, CommandError> {
    match AssertUnwindSafe(handler.execute(cx)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(panic = %message, "Command panicked");
            Err(CommandError::Panicked(message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
