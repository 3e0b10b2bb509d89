//! JSONP tunneling through `GET /jsonp`.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};

use common::{body_text, TestHub, EXAMPLE_URL};

fn tunnel(prefix: &str, params: &[(&str, &str)]) -> Request<Body> {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    Request::builder()
        .method("GET")
        .uri(format!("{prefix}/jsonp?{query}"))
        .body(Body::empty())
        .unwrap()
}

/// Split `cb({...})` into the callback name and the payload.
fn unwrap_callback(body: &str) -> (String, Value) {
    let open = body.find('(').unwrap();
    assert!(body.ends_with(')'));
    let payload = serde_json::from_str(&body[open + 1..body.len() - 1]).unwrap();
    (body[..open].to_string(), payload)
}

#[tokio::test]
async fn test_tunneled_commands_match_native_ones() {
    let hub = TestHub::new();
    let caps = json!({"desiredCapabilities": {"browserName": "memory"}}).to_string();

    let response = hub
        .send(tunnel("", &[("method", "post"), ("path", "/session"), ("callback", "opened"), ("body", &caps)]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/javascript"));
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    let (callback, payload) = unwrap_callback(&body_text(response).await);
    assert_eq!(callback, "opened");
    assert_eq!(payload["status"], 0);
    let id = payload["sessionId"].as_str().unwrap().to_string();
    assert_eq!(hub.server.registry().ids(), vec![id.clone()]);

    let url_body = json!({"url": EXAMPLE_URL}).to_string();
    let path = format!("session/{id}/url");
    let response = hub
        .send(tunnel("", &[("method", "POST"), ("path", &path), ("callback", "cb"), ("body", &url_body)]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let path = format!("/session/{id}/title");
    let response = hub
        .send(tunnel("", &[("method", "GET"), ("path", &path), ("callback", "cb")]))
        .await;
    let (_, payload) = unwrap_callback(&body_text(response).await);
    assert_eq!(payload["value"], "Example Domain");

    let path = format!("/session/{id}");
    let response = hub
        .send(tunnel("", &[("method", "delete"), ("path", &path), ("callback", "closed")]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let (_, payload) = unwrap_callback(&body_text(response).await);
    assert_eq!(payload["status"], 0);
    assert!(hub.server.registry().is_empty());
}

#[tokio::test]
async fn test_tunneled_failures_are_still_200() {
    let hub = TestHub::new();
    let response = hub
        .send(tunnel("", &[("method", "GET"), ("path", "/session/missing/title"), ("callback", "cb")]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let (_, payload) = unwrap_callback(&body_text(response).await);
    assert_eq!(payload["status"], 6);
    assert_eq!(payload["sessionId"], "missing");
    assert_eq!(payload["value"]["class"], "NoSuchSession");
}

#[tokio::test]
async fn test_malformed_tunnels_are_bad_requests() {
    let hub = TestHub::new();

    let response = hub.send(tunnel("", &[("method", "GET"), ("path", "/status")])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("callback"));

    let response = hub
        .send(tunnel("", &[("method", "PUT"), ("path", "/status"), ("callback", "cb")]))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("PUT"));

    let response = hub
        .send(tunnel("", &[("method", ""), ("path", "/status"), ("callback", "cb")]))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_must_be_an_identifier() {
    let hub = TestHub::new();

    let response = hub
        .send(tunnel("", &[("method", "GET"), ("path", "/status"), ("callback", "alert(1);x")]))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let text = body_text(response).await;
    assert!(text.contains("callback"));
    assert!(!text.contains("alert(1);x({"));

    let response = hub
        .send(tunnel("", &[("method", "GET"), ("path", "/status"), ("callback", "jQuery.cb_1")]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let (callback, payload) = unwrap_callback(&body_text(response).await);
    assert_eq!(callback, "jQuery.cb_1");
    assert_eq!(payload["status"], 0);
}

#[tokio::test]
async fn test_tunnel_under_base_path() {
    let hub = TestHub::with_config(|config| config.listener.base_path = "/wd/hub".to_string());
    let response = hub
        .send(tunnel("/wd/hub", &[("method", "GET"), ("path", "/status"), ("callback", "cb")]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let (_, payload) = unwrap_callback(&body_text(response).await);
    assert_eq!(payload["value"]["ready"], true);

    let request = Request::builder()
        .method("GET")
        .uri("/wd/hub/JSONP?method=GET&path=/status&callback=cb")
        .body(Body::empty())
        .unwrap();
    assert_eq!(hub.send(request).await.status(), StatusCode::OK);
}
