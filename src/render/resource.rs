//! Static resource copying.

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::{Attribute, Exchange, RenderError, Renderer};

/// Bytes of a static file plus the name its type is inferred from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub bytes: Bytes,
}

impl Resource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Content type guessed from the file extension.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// Streams the resource stored under one attribute.
#[derive(Debug, Clone)]
pub struct ResourceRenderer {
    attribute: String,
}

impl ResourceRenderer {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

impl Renderer for ResourceRenderer {
    fn render(&self, exchange: &Exchange) -> Result<Response, RenderError> {
        match exchange.attributes.get(&self.attribute) {
            Some(Attribute::Resource(resource)) => Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, resource.content_type())],
                Body::from(resource.bytes.clone()),
            )
                .into_response()),
            Some(_) => Err(RenderError::AttributeType {
                name: self.attribute.clone(),
                expected: "a resource",
            }),
            None => Err(RenderError::MissingAttribute(self.attribute.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Accept, RESPONSE};
    use axum::http::Method;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(Resource::new("hub.html", "").content_type(), "text/html");
        assert_eq!(Resource::new("logo.png", "").content_type(), "image/png");
        assert_eq!(
            Resource::new("blob", "").content_type(),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_copies_bytes() {
        let mut exchange = Exchange::new(Method::GET, "/static/resource/x.css", Accept::default());
        exchange
            .attributes
            .insert(RESPONSE, Attribute::Resource(Resource::new("x.css", "body{}")));

        let response = ResourceRenderer::new(RESPONSE).render(&exchange).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"body{}");
    }

    #[test]
    fn test_missing_resource() {
        let exchange = Exchange::new(Method::GET, "/static/resource/x", Accept::default());
        assert!(matches!(
            ResourceRenderer::new(RESPONSE).render(&exchange),
            Err(RenderError::MissingAttribute(_))
        ));
    }
}
