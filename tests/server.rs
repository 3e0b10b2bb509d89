//! End-to-end tests over a real socket.

mod common;

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use common::TestHub;
use driver_hub::Shutdown;

#[tokio::test]
async fn test_serve_and_shutdown_releases_sessions() {
    let TestHub { server, factory, .. } = TestHub::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    let response = client
        .post(format!("{base}/session"))
        .header("accept", "application/json")
        .json(&json!({"desiredCapabilities": {"browserName": "memory"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()["location"].to_str().unwrap().to_string();

    let body: Value = client
        .get(format!("{base}{location}"))
        .header("accept", "application/json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], 0);
    assert_eq!(body["value"]["browserName"], "memory");

    let body: Value = client
        .get(format!("{base}/status"))
        .header("accept", "application/json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["value"]["sessions"], 1);

    drop(client);
    assert!(shutdown.trigger());
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(factory.launched(), 1);
    assert_eq!(factory.quits(), 1);
}
