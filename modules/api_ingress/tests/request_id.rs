use std::sync::Arc;

use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::request_id::XRequestId;
use api_ingress::{ApiIngress, ApiIngressConfig};
use modkit::RestfulModule;

/// Echoes the request id seen by handlers.
struct EchoModule;

impl RestfulModule for EchoModule {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        Ok(router.route("/echo", get(echo_handler)))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        utoipa::openapi::OpenApiBuilder::new().build()
    }
}

async fn echo_handler(
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> Json<serde_json::Value> {
    Json(json!({ "request_id": request_id }))
}

fn test_app() -> Router {
    ApiIngress::new(ApiIngressConfig::default())
        .with_module(Arc::new(EchoModule))
        .build_router()
        .expect("router")
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let response = test_app()
        .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    assert!(header.as_deref().is_some_and(|v| !v.is_empty()));

    // Handlers see the same id that goes back to the client.
    let json = body_json(response).await;
    assert_eq!(json["request_id"].as_str(), header.as_deref());
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert_eq!(request_id, Some("abc-123"));
    assert_eq!(body_json(response).await["request_id"], "abc-123");
}

#[tokio::test]
async fn unknown_route_still_carries_request_id() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/missing")
                .header("x-request-id", "error-test-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert_eq!(request_id, Some("error-test-123"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = ApiIngress::new(ApiIngressConfig {
        body_limit_mb: 1,
        ..Default::default()
    })
    .with_module(Arc::new(EchoModule))
    .build_router()
    .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-length", (2 * 1024 * 1024).to_string())
                .body(Body::from(vec![0u8; 2 * 1024 * 1024]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
