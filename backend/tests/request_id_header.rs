use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use uuid::Uuid;

mod support;

use support::{get_request, TestApp};

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let app = TestApp::new();
    let response = app.send(get_request("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("request id header");
    assert!(Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn request_id_echoes_client_value_on_errors_too() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .uri("/api/wx/v1/robots/999")
                .header("x-request-id", "client-req-123")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-request-id").expect("header"),
        "client-req-123"
    );
}

#[tokio::test]
async fn correlation_id_is_promoted_to_request_id() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header("x-correlation-id", "corr-req-456")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

    assert_eq!(
        response.headers().get("x-request-id").expect("header"),
        "corr-req-456"
    );
}
