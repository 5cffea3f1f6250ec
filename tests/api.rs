mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use deduction_recon::{api, AppConfig, ReconService};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "recon-test-boundary";

fn app(default_file: &Path, upload_dir: &Path) -> Router {
    app_with_limit(default_file, upload_dir, AppConfig::default().source.max_upload_bytes)
}

fn app_with_limit(default_file: &Path, upload_dir: &Path, max_upload_bytes: usize) -> Router {
    let mut config = AppConfig::default();
    config.source.default_file = default_file.to_path_buf();
    config.source.upload_dir = upload_dir.to_path_buf();
    config.source.max_upload_bytes = max_upload_bytes;
    let service = Arc::new(ReconService::new(&config.source, &config.processing));
    api::router(service, config.source.max_upload_bytes)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload-and-process")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let dir = tempfile::tempdir().unwrap();
    let (status, json) = send_json(app(&dir.path().join("none.xlsx"), dir.path()), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn missing_default_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir.path().join("none.xlsx"), dir.path());
    let (status, json) = send_json(app, get("/api/process-default")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("none.xlsx"));
    assert!(json["traceback"].is_string());
}

#[tokio::test]
async fn process_default_returns_invoice_rows() {
    let dir = tempfile::tempdir().unwrap();
    let sample = common::sample_in(dir.path());
    let (status, json) = send_json(app(&sample, dir.path()), get("/api/process-default")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["total_records"], 2);
    let first = &json["data"][0];
    assert_eq!(first["Amazon Invoice ID"], "INV1");
    assert_eq!(first["Variance"].as_f64(), Some(5.0));
    assert_eq!(first["Classification"], "Disputable");
    assert_eq!(first["Receive Date"], "Jan 19, 2024");
}

#[tokio::test]
async fn summary_exposes_counts_and_kpis() {
    let dir = tempfile::tempdir().unwrap();
    let sample = common::sample_in(dir.path());
    let (status, json) = send_json(app(&sample, dir.path()), get("/api/summary")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_records"], 3);
    assert_eq!(json["total_variance"].as_f64(), Some(5.0));
    assert_eq!(json["classification_breakdown"]["Disputable"], 1);
    assert_eq!(json["classification_breakdown"]["Under-Applied"], 1);
    assert_eq!(json["classification_breakdown"]["Confirmed Valid"], 1);
    assert_eq!(json["recoverable_amount"].as_f64(), Some(10.0));
}

#[tokio::test]
async fn filter_accepts_string_bounds_and_empty_body() {
    let dir = tempfile::tempdir().unwrap();
    let sample = common::sample_in(dir.path());

    let (status, json) = send_json(
        app(&sample, dir.path()),
        post_json(
            "/api/filter",
            r#"{"classification": "Disputable", "min_variance": "5", "upc": ""}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_records"], 1);
    assert_eq!(json["data"][0]["UPC"], "111");
    assert_eq!(json["filters_applied"]["classification"], "Disputable");

    let (status, json) = send_json(app(&sample, dir.path()), post_json("/api/filter", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_records"], 3);
}

#[tokio::test]
async fn filter_rejects_unknown_classification() {
    let dir = tempfile::tempdir().unwrap();
    let sample = common::sample_in(dir.path());
    let (status, json) = send_json(
        app(&sample, dir.path()),
        post_json("/api/filter", r#"{"classification": "Maybe"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Maybe"));
}

#[tokio::test]
async fn chart_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let sample = common::sample_in(dir.path());

    let (status, json) = send_json(app(&sample, dir.path()), get("/api/disputable-items")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_disputable"], 1);
    assert_eq!(json["total_disputable_amount"].as_f64(), Some(10.0));

    let (_, json) = send_json(app(&sample, dir.path()), get("/api/monthly-trends")).await;
    assert_eq!(json["total_months"], 2);
    assert_eq!(json["data"][0]["month"], "2024-01");
    assert_eq!(json["data"][0]["Actual Deductions"].as_f64(), Some(23.0));

    let (_, json) = send_json(app(&sample, dir.path()), get("/api/variance-by-classification")).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
    assert_eq!(json["totals"]["Under-Applied"].as_f64(), Some(5.0));
}

#[tokio::test]
async fn export_writes_csv_rows() {
    let dir = tempfile::tempdir().unwrap();
    let sample = common::sample_in(dir.path());
    let (status, body) = send(app(&sample, dir.path()), get("/api/export")).await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("Purchase Order,UPC,Amazon Invoice ID"));
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn upload_returns_row_level_records() {
    let dir = tempfile::tempdir().unwrap();
    let sample = common::sample_in(dir.path());
    let content = std::fs::read(&sample).unwrap();
    let uploads = dir.path().join("uploads");

    let (status, json) = send_json(
        app(&dir.path().join("none.xlsx"), &uploads),
        multipart_upload("AMZN POs.xlsx", &content),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_records"], 3);
    assert_eq!(json["source_counts"]["control"], 2);
    assert!(json["filename"].as_str().unwrap().ends_with("_AMZN_POs.xlsx"));
    assert_eq!(json["data"][0]["Classification"], "Disputable");
    assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 1);
}

#[tokio::test]
async fn upload_missing_sheet_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let partial = dir.path().join("partial.xlsx");
    common::write_without_control(&partial).unwrap();
    let content = std::fs::read(&partial).unwrap();

    let (status, json) = send_json(
        app(&dir.path().join("none.xlsx"), &dir.path().join("uploads")),
        multipart_upload("partial.xlsx", &content),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Control"));
}

#[tokio::test]
async fn upload_rejects_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let (status, json) = send_json(
        app(&dir.path().join("none.xlsx"), &dir.path().join("uploads")),
        multipart_upload("notes.csv", b"a,b\n1,2\n"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Only .xlsx and .xls allowed"));
}

#[tokio::test]
async fn upload_without_multipart_body_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let (status, json) = send_json(
        app(&dir.path().join("none.xlsx"), dir.path()),
        post_json("/api/upload-and-process", "{}"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    let content = vec![b'x'; 4096];

    let (status, json) = send_json(
        app_with_limit(&dir.path().join("none.xlsx"), &uploads, 512),
        multipart_upload("big.xlsx", &content),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].is_string());
    assert!(json["traceback"].is_string());
    assert!(!uploads.exists());
}
