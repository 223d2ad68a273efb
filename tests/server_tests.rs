// Proxy router tests
// Author: kelexine (https://github.com/kelexine)

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{gateway_config, url, MockFetcher, ORIGIN};
use offline_gateway::cache::MemoryCacheStorage;
use offline_gateway::config::AppConfig;
use offline_gateway::server::{create_router, LocalHost, SOURCE_HEADER};
use offline_gateway::worker::OfflineGateway;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: axum::Router,
    gateway: OfflineGateway,
    fetcher: Arc<MockFetcher>,
    host: Arc<LocalHost>,
}

fn app(manifest: &[&str]) -> TestApp {
    let mut config = AppConfig::default();
    config.gateway = gateway_config("quran-full-v4", manifest);
    config.cache.backend = "memory".to_string();

    let fetcher = MockFetcher::new();
    let host = Arc::new(LocalHost::new(ORIGIN, false).unwrap());
    let gateway = OfflineGateway::builder(config.gateway.clone())
        .notifications(config.notifications.clone())
        .storage(Arc::new(MemoryCacheStorage::new()))
        .fetcher(fetcher.clone())
        .host(host.clone())
        .build()
        .unwrap();
    let router = create_router(config, gateway.clone(), host.clone()).unwrap();
    TestApp {
        router,
        gateway,
        fetcher,
        host,
    }
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

#[tokio::test]
async fn test_proxy_serves_cached_asset() {
    let t = app(&["/index.html"]);
    t.fetcher.serve(&url("/index.html"), "<html>shell</html>");
    t.gateway.install().await.unwrap();
    t.gateway.activate().await.unwrap();

    let response = t
        .router
        .oneshot(Request::get("/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[SOURCE_HEADER], "cache");
    assert_eq!(&body_bytes(response).await[..], b"<html>shell</html>");
}

#[tokio::test]
async fn test_proxy_forwards_post_untouched() {
    let t = app(&[]);
    t.fetcher.serve(&url("/api/progress"), "stored");

    let response = t
        .router
        .oneshot(
            Request::post("/api/progress")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"ayah":255}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[SOURCE_HEADER], "passthrough");
    assert_eq!(t.fetcher.calls(&url("/api/progress")), 1);
    t.gateway.wait_for_background().await;
    assert!(t
        .gateway
        .cache()
        .lookup_url(&url("/api/progress"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_proxy_reports_offline_as_503() {
    let t = app(&[]);
    t.fetcher.set_offline(true);

    let response = t
        .router
        .oneshot(Request::get("/img/logo.png").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["type"], "offline_error");
}

#[tokio::test]
async fn test_health_reports_generation() {
    let t = app(&["/"]);
    t.fetcher.serve(&url("/"), "<html>");
    t.gateway.install().await.unwrap();
    t.gateway.activate().await.unwrap();

    let response = t
        .router
        .oneshot(Request::get("/_gateway/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["checks"]["cache"]["message"]
        .as_str()
        .unwrap()
        .contains("1 entries in quran-full-v4"));
}

#[tokio::test]
async fn test_push_endpoint_shows_notification() {
    let t = app(&[]);

    let response = t
        .router
        .oneshot(
            Request::post("/_gateway/push")
                .body(Body::from(r#"{"body":"Surah Al-Mulk before sleep"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let displayed = t.host.displayed();
    assert_eq!(displayed.len(), 1);
    assert_eq!(displayed[0].1.body, "Surah Al-Mulk before sleep");
}

#[tokio::test]
async fn test_message_endpoint_accepts_skip_waiting() {
    let t = app(&[]);

    let response = t
        .router
        .oneshot(
            Request::post("/_gateway/message")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"type":"SKIP_WAITING"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], br#""skip_waiting""#);
    assert!(t.gateway.skip_waiting_requested());
}

#[tokio::test]
async fn test_sync_endpoint_reaches_registered_client() {
    let t = app(&[]);
    let (_client, mut rx) = t.host.register("/");

    let response = t
        .router
        .oneshot(
            Request::post("/_gateway/sync")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"tag":"sync-data"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["notified"], 1);
    assert!(matches!(
        rx.recv().await,
        Some(offline_gateway::worker::ClientMessage::SyncComplete { .. })
    ));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = app(&[]);
    t.fetcher.serve(&url("/x"), "x");
    let _ = t
        .router
        .clone()
        .oneshot(Request::get("/x").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let response = t
        .router
        .oneshot(Request::get("/_gateway/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let text = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(text.contains("fetch_outcomes_total"));
}
