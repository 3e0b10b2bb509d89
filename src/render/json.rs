//! Empty and JSON renderers.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::command::CommandResponse;

use super::{Attribute, Exchange, RenderError, Renderer};

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Success with no body.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRenderer;

impl Renderer for EmptyRenderer {
    fn render(&self, _exchange: &Exchange) -> Result<Response, RenderError> {
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

/// Serializes one named attribute as the whole body.
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    attribute: String,
}

impl JsonRenderer {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

/// JSON form of an attribute; absent attributes serialize as `null`.
pub(crate) fn attribute_json(exchange: &Exchange, name: &str) -> Result<Value, RenderError> {
    match exchange.attributes.get(name) {
        None => Ok(Value::Null),
        Some(Attribute::Json(value)) => Ok(value.clone()),
        Some(Attribute::Text(text)) => Ok(Value::String(text.clone())),
        Some(Attribute::Failure(failure)) => Ok(failure.to_value()),
        Some(Attribute::Resource(_)) => Err(RenderError::AttributeType {
            name: name.to_string(),
            expected: "JSON",
        }),
    }
}

pub(crate) fn json_response(status: StatusCode, value: &Value) -> Result<Response, RenderError> {
    let body = serde_json::to_string(value)?;
    Ok((status, [(header::CONTENT_TYPE, JSON_UTF8)], body).into_response())
}

impl Renderer for JsonRenderer {
    fn render(&self, exchange: &Exchange) -> Result<Response, RenderError> {
        let value = attribute_json(exchange, &self.attribute)?;
        json_response(StatusCode::OK, &value)
    }
}

/// Error envelope built from the failure attribute. Always a 500.
#[derive(Debug, Clone)]
pub struct JsonErrorRenderer {
    exception: String,
}

impl JsonErrorRenderer {
    pub fn new(exception: impl Into<String>) -> Self {
        Self {
            exception: exception.into(),
        }
    }
}

/// The error envelope for the failure stored under `exception`.
pub(crate) fn error_envelope(exchange: &Exchange, exception: &str) -> Result<Value, RenderError> {
    let failure = exchange
        .attributes
        .failure(exception)
        .ok_or_else(|| RenderError::MissingAttribute(exception.to_string()))?;
    let session_id = exchange.variables.get("sessionId").map(str::to_string);
    Ok(CommandResponse::failure(session_id, failure).to_value())
}

impl Renderer for JsonErrorRenderer {
    fn render(&self, exchange: &Exchange) -> Result<Response, RenderError> {
        let envelope = error_envelope(exchange, &self.exception)?;
        json_response(StatusCode::INTERNAL_SERVER_ERROR, &envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandError;
    use crate::render::{mime, Accept, EXCEPTION, RESPONSE};
    use axum::http::Method;
    use serde_json::json;

    fn exchange() -> Exchange {
        Exchange::new(Method::GET, "/status", Accept::new(Some(mime::JSON)))
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_renderer() {
        let response = EmptyRenderer.render(&exchange()).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_json_renderer_serializes_named_attribute() {
        let mut exchange = exchange();
        exchange
            .attributes
            .insert(RESPONSE, Attribute::Json(json!({"status": 0, "value": 1})));

        let response = JsonRenderer::new(RESPONSE).render(&exchange).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_UTF8);
        assert_eq!(body_of(response).await, r#"{"status":0,"value":1}"#);
    }

    #[tokio::test]
    async fn test_json_renderer_missing_attribute_is_null() {
        let response = JsonRenderer::new("nothing").render(&exchange()).unwrap();
        assert_eq!(body_of(response).await, "null");
    }

    #[tokio::test]
    async fn test_error_renderer_builds_envelope() {
        let mut exchange = exchange();
        exchange.variables.insert("sessionId", "s1");
        exchange.attributes.insert(
            EXCEPTION,
            Attribute::Failure(CommandError::NoSuchWindow("w9".into()).to_failure()),
        );

        let response = JsonErrorRenderer::new(EXCEPTION).render(&exchange).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body_of(response).await).unwrap();
        assert_eq!(body["sessionId"], "s1");
        assert_eq!(body["status"], 23);
        assert_eq!(body["value"]["class"], "NoSuchWindow");
    }

    #[test]
    fn test_error_renderer_requires_failure() {
        let err = JsonErrorRenderer::new(EXCEPTION).render(&exchange()).unwrap_err();
        assert!(matches!(err, RenderError::MissingAttribute(_)));
    }
}
