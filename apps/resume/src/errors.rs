use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;
use crate::resume::controller::CommitError;
use crate::resume::validation::ValidationReport;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed on {} field(s)", .0.errors.len())]
    Validation(ValidationReport),

    #[error("An export is already in progress")]
    ExportInFlight,

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Storage error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl From<CommitError> for AppError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Invalid(report) => AppError::Validation(report),
            CommitError::Store(e) => AppError::Store(e),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InFlight => AppError::ExportInFlight,
            ExportError::Invalid(report) => AppError::Validation(report),
            ExportError::Persist(e) => AppError::Store(e),
            ExportError::Encode(e) => AppError::ExportFailed(format!("{e:#}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Validation(report) => {
                let body = Json(json!({
                    "error": {
                        "code": "VALIDATION_ERROR",
                        "message": "入力内容に誤りがあります",
                        "fields": report.errors,
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::ExportInFlight => (
                StatusCode::CONFLICT,
                "EXPORT_IN_PROGRESS",
                "PDF生成中です。完了までお待ちください".to_string(),
            ),
            AppError::ExportFailed(msg) => {
                tracing::error!("Export failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_FAILED",
                    "PDFの生成に失敗しました。もう一度お試しください".to_string(),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Storage error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "保存に失敗しました".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
