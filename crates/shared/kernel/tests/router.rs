#![cfg(feature = "server")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use beacon_hub::{Event, Hub};
use beacon_kernel::domain::config::ApiConfig;
use beacon_kernel::server::{ApiState, events_router, system_router};
use futures_util::StreamExt;
use std::time::Duration;
use tower::ServiceExt;

fn app(hub: &Hub) -> Router {
    let state = ApiState::builder().config(ApiConfig::default()).hub(hub.clone()).build().unwrap();

    let (router, _api) =
        system_router().merge(events_router()).with_state(state).split_for_parts();
    router
}

fn request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(body.into()).unwrap()
}

async fn json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_subscribers() {
    let hub = Hub::with_defaults();
    let app = app(&hub);
    let _subscriber = hub.attach().await.unwrap();

    let response = app.oneshot(request(Method::GET, "/health", Body::empty())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["subscribers"], 1);
}

#[tokio::test]
async fn test_publish_returns_delivery_report() {
    let hub = Hub::with_defaults();
    let app = app(&hub);
    let mut subscriber = hub.attach().await.unwrap();

    let response = app
        .oneshot(request(Method::POST, "/events?event=greeting", "hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["delivered"], 1);
    assert_eq!(body["dropped"], 0);

    let event = subscriber.recv().await.unwrap();
    assert_eq!(event.name(), Some("greeting"));
    assert_eq!(event.text(), "hello");
}

#[tokio::test]
async fn test_publish_rejects_multiline_event_name() {
    let hub = Hub::with_defaults();
    let response = app(&hub)
        .oneshot(request(Method::POST, "/events?event=a%0Ab", "payload"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hub.stats().published, 0);
}

#[tokio::test]
async fn test_publish_after_shutdown_is_unavailable() {
    let hub = Hub::with_defaults();
    let app = app(&hub);
    hub.shutdown().await;

    let response = app.oneshot(request(Method::POST, "/events", "late")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(json(response).await["error"].as_str().unwrap().contains("Hub closed"));
}

#[tokio::test]
async fn test_sse_stream_frames_and_detach_on_disconnect() {
    let hub = Hub::with_defaults();
    let app = app(&hub);

    let response = app.oneshot(request(Method::GET, "/events", Body::empty())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(hub.members().await.unwrap().len(), 1);

    hub.publish(Event::named("tick", "the time is now")).await.unwrap();
    hub.publish("line one\r\nline two").await.unwrap();

    let mut body = response.into_body().into_data_stream();
    let mut received = String::new();
    while !received.contains("line two") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("frame in time")
            .expect("stream open")
            .unwrap();
        received.push_str(std::str::from_utf8(&chunk).unwrap());
    }

    assert!(received.contains("event: tick\n"));
    assert!(received.contains("id: 1\n"));
    assert!(received.contains("data: the time is now\n\n"));
    assert!(received.contains("data: line one\ndata: line two\n\n"));

    drop(body);
    assert!(hub.members().await.unwrap().is_empty(), "closed stream must detach");
}

#[tokio::test]
async fn test_sse_stream_ends_on_hub_shutdown() {
    let hub = Hub::with_defaults();
    let response = app(&hub).oneshot(request(Method::GET, "/events", Body::empty())).await.unwrap();
    let mut body = response.into_body().into_data_stream();

    hub.shutdown().await;

    let end = tokio::time::timeout(Duration::from_secs(2), body.next()).await.expect("stream ends");
    assert!(end.is_none());
}

#[test]
fn test_state_requires_only_config_and_hub() {
    let err = ApiState::builder().config(ApiConfig::default()).build().unwrap_err();
    assert!(err.to_string().contains("Hub not provided"));
}
