pub mod error;
pub mod handlers;

pub use error::{ApiError, ErrorResponse};
pub use handlers::*;

use crate::service::ReconService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// 构建全部路由, 上传大小受 max_upload_bytes 限制
pub fn router(service: Arc<ReconService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/process-default", get(process_default))
        .route("/api/upload-and-process", post(upload_and_process))
        .route("/api/summary", get(summary))
        .route("/api/filter", post(filter))
        .route("/api/disputable-items", get(disputable_items))
        .route("/api/monthly-trends", get(monthly_trends))
        .route("/api/variance-by-classification", get(variance_by_classification))
        .route("/api/export", get(export_csv))
        .with_state(service)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(max_upload_bytes)))
}
