//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, send, TestApp};

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let t = TestApp::new();
    let response = get(t.app(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let t = TestApp::new();
    let response = get(t.app(), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let t = TestApp::new();
    let response = get(t.app(), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin_with_credentials() {
    let t = TestApp::new();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/users")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();

    let response = send(t.app(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "http://localhost:5173"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn wrong_method_returns_405() {
    let t = TestApp::new();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/upload")
        .body(Body::empty())
        .unwrap();

    let response = send(t.app(), request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
