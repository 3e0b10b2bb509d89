//! JSONP rendering for script-tag clients.
//!
//! The HTTP status is always 200: a script tag that fails to load gives the
//! page no way to read the body, so the real outcome travels inside the
//! wrapped envelope.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use super::json::{attribute_json, error_envelope};
use super::{Attribute, Exchange, RenderError, Renderer};

const JAVASCRIPT_UTF8: &str = "application/javascript; charset=utf-8";

/// Wraps the success or error envelope in `callback(...)`.
#[derive(Debug, Clone)]
pub struct JsonpRenderer {
    response: String,
    exception: String,
    callback: String,
}

impl JsonpRenderer {
    pub fn new(
        response: impl Into<String>,
        exception: impl Into<String>,
        callback: impl Into<String>,
    ) -> Self {
        Self {
            response: response.into(),
            exception: exception.into(),
            callback: callback.into(),
        }
    }

    fn payload(&self, exchange: &Exchange) -> Result<Value, RenderError> {
        if exchange.attributes.failure(&self.exception).is_some() {
            return error_envelope(exchange, &self.exception);
        }
        match exchange.attributes.get(&self.response) {
            // Raw bytes have no JSON form.
            Some(Attribute::Resource(_)) => Ok(Value::Null),
            _ => attribute_json(exchange, &self.response),
        }
    }
}

impl Renderer for JsonpRenderer {
    fn render(&self, exchange: &Exchange) -> Result<Response, RenderError> {
        let callback = exchange
            .attributes
            .text(&self.callback)
            .ok_or_else(|| RenderError::MissingAttribute(self.callback.clone()))?;
        let json = serde_json::to_string(&self.payload(exchange)?)?;
        let body = format!("{callback}({json})");
        Ok((StatusCode::OK, [(header::CONTENT_TYPE, JAVASCRIPT_UTF8)], body).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandError;
    use crate::render::{mime, Accept, CALLBACK, EXCEPTION, RESPONSE};
    use axum::http::Method;
    use serde_json::json;

    fn renderer() -> JsonpRenderer {
        JsonpRenderer::new(RESPONSE, EXCEPTION, CALLBACK)
    }

    fn exchange() -> Exchange {
        let mut exchange = Exchange::new(
            Method::POST,
            "/session/abc/url",
            Accept::new(Some(mime::JSONP)),
        );
        exchange.variables.insert("sessionId", "abc");
        exchange.attributes.insert(CALLBACK, Attribute::Text("cb".into()));
        exchange
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_wraps_success_envelope() {
        let mut exchange = exchange();
        exchange.attributes.insert(
            RESPONSE,
            Attribute::Json(json!({"sessionId": "abc", "status": 0, "value": null})),
        );

        let response = renderer().render(&exchange).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_of(response).await,
            r#"cb({"sessionId":"abc","status":0,"value":null})"#
        );
    }

    #[tokio::test]
    async fn test_failure_still_returns_200() {
        let mut exchange = exchange();
        exchange.attributes.insert(
            EXCEPTION,
            Attribute::Failure(CommandError::Driver("crashed".into()).to_failure()),
        );

        let response = renderer().render(&exchange).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_of(response).await;
        assert!(body.starts_with("cb({"));
        assert!(body.contains(r#""status":13"#));
        assert!(body.contains("crashed"));
    }

    #[test]
    fn test_missing_callback_is_a_render_error() {
        let mut exchange = exchange();
        exchange.attributes = Default::default();
        assert!(matches!(
            renderer().render(&exchange),
            Err(RenderError::MissingAttribute(_))
        ));
    }
}
