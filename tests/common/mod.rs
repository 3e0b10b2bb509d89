//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use driver_hub::driver::{InMemoryDriverFactory, Page, PageElement};
use driver_hub::routing::RouteTables;
use driver_hub::{HubConfig, HubServer};

pub const EXAMPLE_URL: &str = "http://example.com/";
pub const FORM_URL: &str = "http://example.com/form";

/// A hub with a temporary static directory and a simulated browser.
pub struct TestHub {
    pub server: HubServer,
    pub factory: InMemoryDriverFactory,
    pub router: Router,
    _static_dir: TempDir,
}

impl TestHub {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(configure: impl FnOnce(&mut HubConfig)) -> Self {
        Self::build(configure, None)
    }

    /// Hub with caller-supplied route tables.
    pub fn with_routes(tables: RouteTables) -> Self {
        Self::build(|_| {}, Some(tables))
    }

    fn build(configure: impl FnOnce(&mut HubConfig), tables: Option<RouteTables>) -> Self {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("hub.html"), "<h1>hub</h1>").unwrap();
        std::fs::write(static_dir.path().join("style.css"), "body {}").unwrap();

        let mut config = HubConfig::default();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        config.resources.static_dir = static_dir.path().to_string_lossy().into_owned();
        configure(&mut config);

        let factory = example_factory();
        let server = match tables {
            Some(tables) => HubServer::with_routes(config, Arc::new(factory.clone()), tables),
            None => HubServer::with_driver_factory(config, Arc::new(factory.clone())).unwrap(),
        };
        let router = server.router();
        Self {
            server,
            factory,
            router,
            _static_dir: static_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Open a session and return its id.
    pub async fn new_session(&self) -> String {
        let response = self
            .send(post_json("/session", serde_json::json!({"desiredCapabilities": {"browserName": "memory"}})))
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        location.rsplit('/').next().unwrap().to_string()
    }
}

/// Two pages: a landing page with a link and a small form.
pub fn example_factory() -> InMemoryDriverFactory {
    InMemoryDriverFactory::new()
        .with_page(
            EXAMPLE_URL,
            Page::new("Example Domain")
                .with(PageElement::new("h1").text("Example Domain"))
                .with(
                    PageElement::new("a")
                        .id("more")
                        .attr("href", FORM_URL)
                        .text("More information"),
                ),
        )
        .with_page(
            FORM_URL,
            Page::new("Form")
                .with(PageElement::new("input").id("q").attr("name", "q"))
                .with(PageElement::new("button").id("go").text("Go")),
        )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
