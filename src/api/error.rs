use crate::error::{ServiceError, TransformError};
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::error::Error as StdError;
use thiserror::Error;

/// 接口错误
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("failed to export CSV: {0}")]
    Export(#[from] csv::Error),
}

impl From<TransformError> for ApiError {
    fn from(err: TransformError) -> Self {
        ApiError::Service(ServiceError::Transform(err))
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub traceback: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Service(e) => match e {
                ServiceError::Transform(TransformError::MissingFile(_)) => StatusCode::NOT_FOUND,
                ServiceError::Transform(t) if t.is_malformed_input() => StatusCode::BAD_REQUEST,
                ServiceError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
                ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// 错误链, 逐层列出 source
pub fn error_chain(err: &dyn StdError) -> String {
    let mut lines = vec![format!("{err:?}")];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            traceback: error_chain(&self),
        };
        (status, Json(body)).into_response()
    }
}
