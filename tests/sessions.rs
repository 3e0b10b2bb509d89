//! Concurrency behaviour of sessions under load.

mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use futures_util::future::join_all;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{body_json, delete, get, TestHub};
use driver_hub::command::{CommandContext, CommandError, Handler, HandlerFactory, Outcome, Scope};
use driver_hub::http::build_route_tables;
use driver_hub::render::{JsonRenderer, RESPONSE};

/// Counts how many commands hold a driver at the same time.
#[derive(Clone, Default)]
struct Overlap {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

struct SlowCommand {
    overlap: Overlap,
}

#[async_trait]
impl Handler for SlowCommand {
    async fn execute(&mut self, cx: &mut CommandContext<'_>) -> Result<Value, CommandError> {
        let url = cx.driver()?.current_url().await?;
        let now = self.overlap.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.overlap.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.overlap.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(json!(url))
    }
}

fn slow_hub(overlap: &Overlap) -> TestHub {
    let mut tables = build_route_tables().unwrap();
    let overlap = overlap.clone();
    let factory = HandlerFactory::new("SlowCommand", Scope::Driver, move |_| {
        Ok(Box::new(SlowCommand {
            overlap: overlap.clone(),
        }) as Box<dyn Handler>)
    });
    tables
        .get
        .bind("/session/:sessionId/slow", factory)
        .unwrap()
        .on(Outcome::Success, Arc::new(JsonRenderer::new(RESPONSE)));
    TestHub::with_routes(tables)
}

#[tokio::test]
async fn test_commands_on_one_session_never_overlap() {
    let overlap = Overlap::default();
    let hub = slow_hub(&overlap);
    let id = hub.new_session().await;

    let uri = format!("/session/{id}/slow");
    let responses = join_all((0..5).map(|_| hub.send(get(&uri)))).await;
    for response in responses {
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(overlap.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_separate_sessions_run_concurrently() {
    let overlap = Overlap::default();
    let hub = slow_hub(&overlap);
    let first = hub.new_session().await;
    let second = hub.new_session().await;

    let (a, b) = tokio::join!(
        hub.send(get(&format!("/session/{first}/slow"))),
        hub.send(get(&format!("/session/{second}/slow"))),
    );
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    assert_eq!(overlap.peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_delete_waits_for_running_command() {
    let overlap = Overlap::default();
    let hub = slow_hub(&overlap);
    let id = hub.new_session().await;

    let router = hub.router.clone();
    let uri = format!("/session/{id}/slow");
    let running = tokio::spawn(async move { router.oneshot(get(&uri)).await.unwrap() });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let response = hub.send(delete(&format!("/session/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = running.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["value"], "about:blank");
    assert_eq!(hub.factory.quits(), 1);
    assert!(hub.server.registry().is_empty());
}

#[tokio::test]
async fn test_concurrent_creation_yields_unique_ids() {
    let hub = TestHub::new();
    let ids = join_all((0..20).map(|_| hub.new_session())).await;
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 20);
    assert_eq!(hub.server.registry().len(), 20);

    // Deleting twice releases the driver once.
    let registry = hub.server.registry();
    assert!(registry.delete(&ids[0]).await);
    assert!(!registry.delete(&ids[0]).await);
    assert_eq!(hub.factory.quits(), 1);
}
