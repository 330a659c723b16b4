use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use recollate_server::{
    CandidateMeta, ReconstructError, ReconstructMeta, ReconstructProvider, ReconstructRequest,
    ReconstructResponse, build_api_router,
};

const MAX_UPLOAD: usize = 1024 * 1024;

struct StubProvider;

#[async_trait]
impl ReconstructProvider for StubProvider {
    async fn reconstruct(
        &self,
        request: ReconstructRequest,
    ) -> Result<ReconstructResponse, ReconstructError> {
        Ok(ReconstructResponse {
            pdf: request.bytes,
            meta: ReconstructMeta {
                page_count: 2,
                method: "page-number".to_string(),
                confidence: 0.92,
                initial_order: vec![0, 1],
                final_order: vec![1, 0],
                pairwise_confidences: vec![0.92],
                candidates: vec![CandidateMeta {
                    method: "page-number".to_string(),
                    confidence: 0.92,
                }],
                reasoning: vec!["stub".to_string()],
            },
        })
    }
}

struct FailingProvider;

#[async_trait]
impl ReconstructProvider for FailingProvider {
    async fn reconstruct(
        &self,
        _request: ReconstructRequest,
    ) -> Result<ReconstructResponse, ReconstructError> {
        Err(ReconstructError::internal("engine unavailable"))
    }
}

fn pdf_body() -> Vec<u8> {
    b"%PDF-1.7 fake document bytes".to_vec()
}

#[tokio::test]
async fn healthz_returns_ok_json() {
    let app = build_api_router(Arc::new(StubProvider), MAX_UPLOAD);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/healthz")
                .body(Body::empty())
                .expect("request builder should not fail"),
        )
        .await
        .expect("healthz handler should respond");

    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body must be readable")
        .to_bytes();
    let value: Value =
        serde_json::from_slice(body_bytes.as_ref()).expect("healthz response must be valid JSON");
    assert_eq!(value, json!({ "status": "ok" }));
}

#[tokio::test]
async fn reconstruct_returns_pdf_with_meta_header() {
    let app = build_api_router(Arc::new(StubProvider), MAX_UPLOAD);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/reconstruct")
                .header("x-filename", "shuffled.pdf")
                .body(Body::from(pdf_body()))
                .expect("request builder should not fail"),
        )
        .await
        .expect("reconstruct handler should respond");

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .expect("content-type header present")
        .to_str()
        .expect("content-type must be valid utf-8");
    assert_eq!(content_type, "application/pdf");

    let meta_header = response
        .headers()
        .get("x-result-meta")
        .expect("result metadata header present")
        .to_str()
        .expect("metadata header must be valid utf-8");
    let meta: Value = serde_json::from_str(meta_header).expect("metadata must be valid JSON");
    assert_eq!(meta["page_count"], json!(2));
    assert_eq!(meta["method"], json!("page-number"));
    assert_eq!(meta["final_order"], json!([1, 0]));

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body must be readable")
        .to_bytes();
    assert_eq!(body_bytes.as_ref(), pdf_body().as_slice());
}

#[tokio::test]
async fn empty_body_is_rejected_as_bad_request() {
    let app = build_api_router(Arc::new(StubProvider), MAX_UPLOAD);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/reconstruct")
                .body(Body::empty())
                .expect("request builder should not fail"),
        )
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_as_bad_request() {
    let app = build_api_router(Arc::new(StubProvider), MAX_UPLOAD);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/reconstruct")
                .body(Body::from("<html>not a pdf</html>"))
                .expect("request builder should not fail"),
        )
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body must be readable")
        .to_bytes();
    let value: Value = serde_json::from_slice(body_bytes.as_ref()).expect("error body is JSON");
    assert!(value["error"].as_str().expect("error message").contains("not a PDF"));
}

#[tokio::test]
async fn provider_failure_maps_to_internal_error() {
    let app = build_api_router(Arc::new(FailingProvider), MAX_UPLOAD);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/reconstruct")
                .body(Body::from(pdf_body()))
                .expect("request builder should not fail"),
        )
        .await
        .expect("handler should respond");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
