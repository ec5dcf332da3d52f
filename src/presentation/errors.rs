// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::models::scrape_job::DomainError;
use crate::queue::job_queue::QueueError;
use crate::utils::errors::RepositoryError;

/// 接口层错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求参数不合法
    #[error("Validation error: {0}")]
    Validation(String),

    /// 请求的资源不存在
    #[error("{0} not found")]
    NotFound(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 根据错误链中的具体类型选择状态码
    pub fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<ApiError>() {
            return match err {
                ApiError::Validation(_) => StatusCode::BAD_REQUEST,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            };
        }
        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return repository_status(err);
        }
        if let Some(err) = self.0.downcast_ref::<QueueError>() {
            return match err {
                QueueError::Repository(inner) => repository_status(inner),
                QueueError::NotQueued(_) | QueueError::NotTerminal(_) => StatusCode::CONFLICT,
            };
        }
        if let Some(err) = self.0.downcast_ref::<DomainError>() {
            return match err {
                DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
                DomainError::InvalidStateTransition { .. } | DomainError::RetryBudgetExhausted { .. } => {
                    StatusCode::CONFLICT
                }
            };
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::scrape_job::JobStatus;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(ApiError::Validation("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::from(RepositoryError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(RepositoryError::Conflict("done".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(QueueError::Repository(RepositoryError::NotFound)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(QueueError::NotQueued(Uuid::nil())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(DomainError::InvalidStateTransition {
                from: JobStatus::Running,
                action: "retry_job"
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(DomainError::ValidationError("empty".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
